//! floodgauge -- Concurrent UDP throughput benchmarking harness.
//!
//! Spins up many client endpoints, floods one or more target servers with a
//! fixed message corpus at a bounded cadence, samples the inbound message rate
//! over fixed windows, and reports ranked throughput and packet-loss
//! statistics across servers.

pub mod bench;
pub mod config;
pub mod echo;
pub mod report;

pub use bench::run_all;
pub use config::Config;
