use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use floodgauge::config::Config;

#[derive(Parser)]
#[command(
    name = "floodgauge",
    about = "Concurrent UDP throughput benchmarking harness",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark against the configured servers
    Run {
        /// Path to a TOML config file (falls back to FLOODGAUGE_CONFIG, then defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of concurrent client endpoints
        #[arg(long)]
        clients: Option<usize>,

        /// Override the burst cadence in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Log every sent and received datagram at debug level
        #[arg(long)]
        log_messages: bool,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run the built-in UDP echo server (a local benchmark subject)
    Echo {
        /// UDP port to bind (0 for an ephemeral port)
        #[arg(long, default_value = "5001")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            clients,
            delay_ms,
            log_messages,
            json,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(&path)?,
                None => Config::load_or_default(),
            }
            .apply_env();
            if let Some(n) = clients {
                cfg.clients = n;
            }
            if let Some(ms) = delay_ms {
                cfg.delay_ms = ms;
            }
            if log_messages {
                cfg.log_messages = true;
            }

            tracing::info!(
                servers = cfg.servers.len(),
                clients = cfg.clients,
                delay_ms = cfg.delay_ms,
                "starting benchmark"
            );
            let results = floodgauge::run_all(&cfg).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("\n{}", floodgauge::report::render_table(&results));
            }
        }
        Commands::Echo { port } => {
            let (handle, task) = floodgauge::echo::EchoServer::start(port).await?;
            println!("UDP echo server listening on port {}", handle.port);
            tokio::signal::ctrl_c().await?;
            handle.shutdown();
            let stats = task.await?;
            println!("Echoed {} packets ({} bytes)", stats.packets, stats.bytes);
        }
    }

    Ok(())
}
