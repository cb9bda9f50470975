// Metrics module - Prometheus counters for the cache and sync engine
//
// Provides:
// - Cache lookups by strategy and outcome (hit, miss, stale, fallback)
// - Background refresh outcomes
// - Offline writes queued and replay outcomes
// - Queue depth gauge

use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics registry for the worker
pub struct WorkerMetrics {
    /// Cache lookups, labelled by strategy and outcome
    pub cache_lookups: IntCounterVec,

    /// Background refreshes of cache-first hits, labelled by outcome
    pub background_refreshes: IntCounterVec,

    /// Writes captured into the durable queue while offline
    pub queued_requests: IntCounter,

    /// Replay attempts, labelled by outcome (replayed, failed, deferred)
    pub replays: IntCounterVec,

    /// Entries left in the durable queue after the last sync cycle
    pub queue_depth: IntGauge,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<WorkerMetrics> = OnceLock::new();

impl WorkerMetrics {
    /// Initialize and return the global metrics instance
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let cache_lookups = register_int_counter_vec!(
                "hikyaku_cache_lookups_total",
                "Cache lookups by strategy and outcome",
                &["strategy", "outcome"]
            )
            .expect("Failed to register cache_lookups_total metric");

            let background_refreshes = register_int_counter_vec!(
                "hikyaku_background_refreshes_total",
                "Background refreshes of cache-first hits by outcome",
                &["outcome"] // stored, skipped, failed
            )
            .expect("Failed to register background_refreshes_total metric");

            let queued_requests = register_int_counter!(
                "hikyaku_queued_requests_total",
                "Write requests queued while offline"
            )
            .expect("Failed to register queued_requests_total metric");

            let replays = register_int_counter_vec!(
                "hikyaku_replays_total",
                "Replay attempts of queued requests by outcome",
                &["outcome"] // replayed, failed, deferred
            )
            .expect("Failed to register replays_total metric");

            let queue_depth = register_int_gauge!(
                "hikyaku_queue_depth",
                "Entries left in the durable queue after the last sync cycle"
            )
            .expect("Failed to register queue_depth metric");

            WorkerMetrics {
                cache_lookups,
                background_refreshes,
                queued_requests,
                replays,
                queue_depth,
            }
        })
    }

    pub fn record_lookup(&self, strategy: &str, outcome: &str) {
        self.cache_lookups
            .with_label_values(&[strategy, outcome])
            .inc();
    }

    pub fn record_refresh(&self, outcome: &str) {
        self.background_refreshes.with_label_values(&[outcome]).inc();
    }

    pub fn record_replay(&self, outcome: &str) {
        self.replays.with_label_values(&[outcome]).inc();
    }
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> String {
    // Make sure our collectors are registered even if nothing ran yet
    WorkerMetrics::global();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
