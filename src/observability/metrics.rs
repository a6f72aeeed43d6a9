//! Metrics collection.
//!
//! # Metrics
//! - `valv_navigations_total` (counter): history operations by kind
//! - `valv_resolutions_total` (counter): router resolutions by outcome
//! - `valv_resolutions_abandoned_total` (counter): superseded resolutions
//! - `valv_absorbed_errors_total` (counter): logged-and-swallowed failures
//!
//! # Design Decisions
//! - Labels are static strings, no per-path cardinality
//! - No exporter is bundled; the host installs a recorder if it wants one

/// Count a history operation (`navigate`, `replace`, `back`, `paginate`).
pub fn record_navigation(kind: &'static str) {
    metrics::counter!("valv_navigations_total", "kind" => kind).increment(1);
}

/// Count a finished resolution (`matcher`, `route`, `not_found`).
pub fn record_resolution(outcome: &'static str) {
    metrics::counter!("valv_resolutions_total", "outcome" => outcome).increment(1);
}

/// Count a resolution dropped because a newer path arrived.
pub fn record_abandoned() {
    metrics::counter!("valv_resolutions_abandoned_total").increment(1);
}

/// Count a failure that was logged instead of propagated.
pub fn record_absorbed_error(kind: &'static str) {
    metrics::counter!("valv_absorbed_errors_total", "kind" => kind).increment(1);
}
