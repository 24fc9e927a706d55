//! Process-wide counters for poll cycle outcomes.
use std::sync::atomic::{AtomicU64, Ordering};

static POLLS_OK: AtomicU64 = AtomicU64::new(0);
static POLLS_FAILED: AtomicU64 = AtomicU64::new(0);
static NODES_ADDED: AtomicU64 = AtomicU64::new(0);
static NODES_REMOVED: AtomicU64 = AtomicU64::new(0);
static TRACEROUTES_OK: AtomicU64 = AtomicU64::new(0);
static TRACEROUTES_FAILED: AtomicU64 = AtomicU64::new(0);

pub fn inc_polls_ok() {
    POLLS_OK.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_polls_failed() {
    POLLS_FAILED.fetch_add(1, Ordering::Relaxed);
}
pub fn add_nodes_added(n: usize) {
    NODES_ADDED.fetch_add(n as u64, Ordering::Relaxed);
}
pub fn add_nodes_removed(n: usize) {
    NODES_REMOVED.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn record_traceroute(success: bool) {
    if success {
        TRACEROUTES_OK.fetch_add(1, Ordering::Relaxed);
    } else {
        TRACEROUTES_FAILED.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub nodes_added: u64,
    pub nodes_removed: u64,
    pub traceroutes_ok: u64,
    pub traceroutes_failed: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        polls_ok: POLLS_OK.load(Ordering::Relaxed),
        polls_failed: POLLS_FAILED.load(Ordering::Relaxed),
        nodes_added: NODES_ADDED.load(Ordering::Relaxed),
        nodes_removed: NODES_REMOVED.load(Ordering::Relaxed),
        traceroutes_ok: TRACEROUTES_OK.load(Ordering::Relaxed),
        traceroutes_failed: TRACEROUTES_FAILED.load(Ordering::Relaxed),
    }
}
