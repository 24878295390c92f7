//! Structured query tracing for relation entry points.
//!
//! Events use target `tyrel::query_json` and are intended to be consumed with:
//! `TYREL_LOG=tyrel::query_json=trace TYREL_LOG_FORMAT=json`.
//!
//! Environment:
//! - `TYREL_QUERY_RUN_ID`: optional run identifier attached to every event.

use crate::types::TypeId;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "tyrel::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| std::env::var("TYREL_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string()))
        .as_str()
}

#[inline]
pub(crate) fn relation_start(query_id: u64, op: &'static str, lhs: TypeId, rhs: TypeId, depth: Option<u32>) {
    trace!(
        target: "tyrel::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        lhs_type_id = lhs.0,
        rhs_type_id = rhs.0,
        depth = depth.map_or(-1, i64::from)
    );
}

#[inline]
pub(crate) fn relation_end(query_id: u64, op: &'static str, result: bool, iterations: u64, cycles: u64) {
    trace!(
        target: "tyrel::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result,
        iterations,
        cycles
    );
}
