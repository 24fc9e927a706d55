//! # Meshwatch - Topology Monitor for Meshtastic Gateways
//!
//! Meshwatch watches a local Meshtastic radio through the official `meshtastic`
//! command line tool. It polls `meshtastic --info` on a fixed interval, parses
//! the text dump into a typed topology snapshot, reports nodes that joined or
//! left the mesh since the previous poll, and traces the radio path to every
//! newly seen node with `meshtastic --traceroute`.
//!
//! ## Features
//!
//! - **Text Protocol Parsing**: Liberal, prefix-driven parsing of the CLI's diagnostic output, including JSON spread over many lines.
//! - **Topology Diffing**: Added/removed node detection that never reports the gateway itself as new.
//! - **Route Tracing**: Outbound and return paths with per-hop SNR for every new node.
//! - **Sequential Polling**: One CLI invocation at a time, as the half-duplex radio link requires.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshwatch::config::Config;
//! use meshwatch::meshtastic::MeshtasticCli;
//! use meshwatch::monitor::Monitor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let cli = MeshtasticCli::new(&config.meshtastic);
//!     Monitor::from_config(cli, &config).run().await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`meshtastic`] - CLI output parsers, topology diff and CLI invocation
//! - [`monitor`] - the poll cycle and its fixed-interval loop
//! - [`config`] - configuration management
//! - [`logutil`] - log sanitising helpers
//! - [`metrics`] - poll and traceroute counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │     Monitor     │ ← Poll loop, one cycle at a time
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Parsers and   │ ← Pure text-in, struct-out
//! │  Topology Diff  │
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  meshtastic CLI │ ← External process
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod meshtastic;
pub mod metrics;
pub mod monitor;
