//! Metric names. The `metrics` facade no-ops until the embedding
//! application installs a recorder; this library never installs one.

/// Counter: external occupant fetches issued.
pub const FETCHES_TOTAL: &str = "roomslot_source_fetches_total";

/// Counter: fetches that failed or timed out and were degraded to empty.
pub const FETCH_FAILURES_TOTAL: &str = "roomslot_source_fetch_failures_total";

/// Histogram: fetch latency in seconds, degraded fetches included.
pub const FETCH_DURATION_SECONDS: &str = "roomslot_source_fetch_duration_seconds";

/// Counter: bulk aggregations stopped early by cancellation.
pub const AGGREGATIONS_CANCELLED_TOTAL: &str = "roomslot_aggregations_cancelled_total";
