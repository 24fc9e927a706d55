//! Poll cycle orchestration.
//!
//! Each cycle fetches `--info`, parses it, diffs it against the snapshot from
//! the previous cycle and traceroutes every node that newly appeared. The
//! previous snapshot is passed into [`run_cycle`] and the one to keep is handed
//! back in [`CycleOutcome::snapshot`], so no state outlives the caller's loop.
//!
//! Cycles are strictly sequential: [`Monitor::run`] awaits a whole cycle,
//! including one traceroute at a time, before taking the next timer tick. The
//! radio link is half-duplex and concurrent CLI invocations would interleave.

use anyhow::Result;
use log::{debug, info, warn};
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::Config;
use crate::logutil::{escape_log, head_preview};
use crate::meshtastic::{
    diff_snapshots, parse_node_info, parse_traceroute, CliError, MeshCli, TopologyDiff,
    TopologySnapshot, TracerouteResult,
};
use crate::metrics;

#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub traceroute_new_nodes: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            traceroute_new_nodes: true,
        }
    }
}

/// Traceroute outcome for one newly seen node.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceReport {
    pub node_id: String,
    pub result: TracerouteResult,
}

#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    /// Snapshot to pass into the next cycle. Equals the previous one when this
    /// cycle could not fetch or parse the node info.
    pub snapshot: Option<TopologySnapshot>,
    pub diff: TopologyDiff,
    /// In the order the traceroutes were run.
    pub traces: Vec<TraceReport>,
    pub error: Option<String>,
}

/// Trace one node. Tool failures are treated as "no route", not as errors.
async fn trace_node<C: MeshCli>(cli: &C, node_id: &str) -> TracerouteResult {
    match cli.traceroute(node_id).await {
        Ok(text) => parse_traceroute(&text),
        Err(CliError::Exit {
            code,
            stderr,
            stdout,
        }) => {
            warn!(
                "Traceroute to {} exited with {:?}: {}",
                node_id,
                code,
                escape_log(&stderr)
            );
            // the CLI prints its abort banner on stdout before exiting non-zero
            parse_traceroute(&stdout)
        }
        Err(e) => {
            warn!("Traceroute to {} failed: {}", node_id, e);
            TracerouteResult::failed()
        }
    }
}

/// Run one full poll cycle against `previous`.
pub async fn run_cycle<C: MeshCli>(
    cli: &C,
    previous: Option<TopologySnapshot>,
    options: &CycleOptions,
) -> CycleOutcome {
    debug!("Getting node info...");
    let text = match cli.info().await {
        Ok(text) => text,
        Err(e) => {
            warn!("No node info found: {}", e);
            metrics::inc_polls_failed();
            return CycleOutcome {
                snapshot: previous,
                error: Some(e.to_string()),
                ..Default::default()
            };
        }
    };
    let current = match parse_node_info(&text) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("{} (output began: {})", e, head_preview(&text, 3));
            metrics::inc_polls_failed();
            return CycleOutcome {
                snapshot: previous,
                error: Some(e.to_string()),
                ..Default::default()
            };
        }
    };
    metrics::inc_polls_ok();

    match (current.my_info.node_number, current.own_id()) {
        (Some(num), Some(id)) => info!("My Node Num: {} ({})", num, id),
        _ => debug!("Radio did not report its own node number"),
    }
    debug!(
        "Owner '{}', firmware {}, {} nodes",
        current.owner,
        current.metadata.firmware_version().unwrap_or("unknown"),
        current.nodes.len()
    );

    let diff = diff_snapshots(previous.as_ref(), &current);
    metrics::add_nodes_added(diff.added.len());
    metrics::add_nodes_removed(diff.removed.len());

    let mut traces = Vec::new();
    for node_id in &diff.added {
        match current.nodes.get(node_id) {
            Some(entry) => info!(
                "New node appeared: {} {} {}",
                node_id,
                entry.short_label(),
                entry.label()
            ),
            None => info!("New node appeared: {}", node_id),
        }
        if !options.traceroute_new_nodes {
            continue;
        }
        let result = trace_node(cli, node_id).await;
        metrics::record_traceroute(result.success);
        if result.success {
            info!(
                "Outbound route: {}",
                TracerouteResult::describe_route(&result.outbound_route)
            );
            info!(
                "Inbound route: {}",
                TracerouteResult::describe_route(&result.inbound_route)
            );
        } else {
            info!("Failed to trace route to {}", node_id);
        }
        traces.push(TraceReport {
            node_id: node_id.clone(),
            result,
        });
    }

    for node_id in &diff.removed {
        info!("Node disappeared: {}", node_id);
    }

    CycleOutcome {
        snapshot: Some(current),
        diff,
        traces,
        error: None,
    }
}

/// Fixed-interval poll loop.
pub struct Monitor<C: MeshCli> {
    cli: C,
    period: Duration,
    options: CycleOptions,
}

impl<C: MeshCli> Monitor<C> {
    pub fn new(cli: C, period: Duration, options: CycleOptions) -> Self {
        Self {
            cli,
            period,
            options,
        }
    }

    pub fn from_config(cli: C, config: &Config) -> Self {
        Self::new(
            cli,
            Duration::from_secs(config.monitor.update_interval_secs),
            CycleOptions {
                traceroute_new_nodes: config.monitor.traceroute_new_nodes,
            },
        )
    }

    /// Poll until Ctrl-C. A cycle in progress always runs to completion first.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Monitoring mesh every {}s (traceroute new nodes: {})",
            self.period.as_secs(),
            self.options.traceroute_new_nodes
        );
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        let mut previous: Option<TopologySnapshot> = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = run_cycle(&self.cli, previous.take(), &self.options).await;
                    previous = outcome.snapshot;
                    debug!("Metrics: {:?}", metrics::snapshot());
                }
                res = &mut shutdown => {
                    res?;
                    info!("Shutting down monitor");
                    break;
                }
            }
        }
        Ok(())
    }
}
