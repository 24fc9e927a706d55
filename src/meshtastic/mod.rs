//! # Meshtastic CLI Text Protocol
//!
//! This module turns the human-oriented output of the `meshtastic` command line
//! tool into typed values, and compares successive topology snapshots.
//!
//! ## Components
//!
//! - [`node_id`] - `!hex` node id encoding and decoding
//! - [`info`] - `--info` dump parser producing a [`TopologySnapshot`]
//! - [`traceroute`] - `--traceroute` output parser producing a [`TracerouteResult`]
//! - [`topology`] - added/removed node detection between two snapshots
//! - [`cli`] - process invocation of the tool itself
//!
//! Everything except [`cli`] is pure: text in, values out, no I/O and no logging.
//!
//! ## Example
//!
//! ```rust
//! use meshwatch::meshtastic::{parse_node_info, parse_traceroute, diff_snapshots};
//!
//! let snapshot = parse_node_info(
//!     "Owner: Alice\nMy info: {\"myNodeNum\": 42}\nNodes in mesh: [{\"num\": 42}, {\"num\": 7}]\n",
//! )
//! .unwrap();
//! let diff = diff_snapshots(None, &snapshot);
//! assert!(diff.added.contains("!7"));
//! assert!(!diff.added.contains("!2a"));
//!
//! let route = parse_traceroute("!2a --> !7 (-5.25dB)");
//! assert!(route.success);
//! ```
//!
//! ## Error Handling
//!
//! - [`MeshError::MalformedNodeInfo`] when the node list is missing or is not JSON
//! - [`MeshError::MalformedIdentifier`] for ids that are not hexadecimal
//! - [`CliError`] for process failures of the external tool
//!
//! The traceroute parser never fails; an untraceable node yields `success == false`.

pub mod cli;
pub mod errors;
pub mod info;
pub mod node_id;
pub mod topology;
pub mod traceroute;

pub use cli::{check_cli, MeshCli, MeshtasticCli};
pub use errors::{CliError, MeshError};
pub use info::{parse_node_info, NodeEntry, TopologySnapshot};
pub use node_id::{decode_id, encode_id};
pub use topology::{diff_snapshots, diff_topology, TopologyDiff};
pub use traceroute::{parse_traceroute, RouteHop, TracerouteResult};
