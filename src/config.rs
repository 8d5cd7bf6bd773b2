//! TOML configuration for the floodgauge benchmark harness.
//!
//! Layered model with compiled-in defaults, an environment variable override
//! for the config file path, and CLI flag overrides applied in `main`.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default message corpus: one burst sends each of these once per endpoint.
const DEFAULT_CORPUS: &[&str] = &[
    "Hello World!",
    "Hello World! 1",
    "Hello World! 2",
    "Hello World! 3",
    "Hello World! 4",
    "Hello World! 5",
    "Hello World! 6",
    "Hello World! 7",
    "Hello World! 8",
    "Hello World! 9",
    "What is the meaning of life?",
    "where is the bathroom?",
    "zoo",
    "kangaroo",
    "erlang",
    "elixir",
    "bun",
    "mochi",
    "typescript",
    "javascript",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("no servers configured")]
    NoServers,

    #[error("message corpus is empty")]
    EmptyCorpus,

    #[error("clients must be at least 1")]
    NoClients,

    #[error("invalid address {address:?} for server {name:?}")]
    BadAddress { name: String, address: String },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for one benchmark invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent client endpoints per test.
    pub clients: usize,
    /// Delay between bursts, in milliseconds.
    pub delay_ms: u64,
    /// Cooldown between consecutive server tests, in milliseconds.
    pub wait_between_tests_ms: u64,
    /// Sampling window period, in milliseconds.
    pub sample_window_ms: u64,
    /// Number of accepted (nonzero) windows that complete one server's test.
    pub runs_per_server: usize,
    /// Window ticks before an unresponsive target is declared unreachable.
    /// `0` disables the deadline and the sampling loop runs until it collects
    /// `runs_per_server` runs, however long that takes.
    pub max_windows: usize,
    /// Log every received datagram at debug level.
    pub log_messages: bool,
    /// Message corpus sent in order by every endpoint on every burst.
    pub messages: Vec<String>,
    /// Benchmark subjects, tested sequentially in this order.
    pub servers: Vec<ServerTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clients: 100,
            delay_ms: 64,
            wait_between_tests_ms: 5000,
            sample_window_ms: 1000,
            runs_per_server: 5,
            max_windows: 60,
            log_messages: false,
            messages: DEFAULT_CORPUS.iter().map(|s| s.to_string()).collect(),
            servers: vec![ServerTarget {
                name: "Rust UDP".to_string(),
                address: "127.0.0.1:5001".to_string(),
                protocol: Protocol::Udp,
            }],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "loaded benchmark configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `FLOODGAUGE_CONFIG` environment variable.
    /// 2. Compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var("FLOODGAUGE_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "FLOODGAUGE_CONFIG set but file could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// Apply environment overrides. `FLOODGAUGE_LOG_MESSAGES=1` enables
    /// per-datagram logging regardless of the file value.
    pub fn apply_env(mut self) -> Self {
        if std::env::var("FLOODGAUGE_LOG_MESSAGES").as_deref() == Ok("1") {
            self.log_messages = true;
        }
        self
    }

    /// Check invariants the benchmark relies on before any socket is bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        if self.messages.is_empty() {
            return Err(ConfigError::EmptyCorpus);
        }
        if self.clients == 0 {
            return Err(ConfigError::NoClients);
        }
        for server in &self.servers {
            if server.address.parse::<SocketAddr>().is_err() {
                return Err(ConfigError::BadAddress {
                    name: server.name.clone(),
                    address: server.address.clone(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server targets
// ---------------------------------------------------------------------------

/// One benchmark subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTarget {
    /// Display name used in logs and the final report.
    pub name: String,
    /// `host:port` the bursts are sent to.
    pub address: String,
    #[serde(default)]
    pub protocol: Protocol,
}

impl ServerTarget {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.address.parse().map_err(|_| ConfigError::BadAddress {
            name: self.name.clone(),
            address: self.address.clone(),
        })
    }
}

/// Transport used to reach a target. Only UDP is exercised today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Udp => write!(f, "udp"),
        }
    }
}
