use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static MIGRATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "voice_pool_migrations_total",
        "Total resource migrations completed"
    )
    .expect("register migrations_total")
});

pub static MIGRATION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "voice_pool_migration_failures_total",
        "Total failed migration attempts"
    )
    .expect("register migration_failures_total")
});

pub static RETRIES_REPLAYED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "voice_pool_retries_replayed_total",
        "Total retry-queue attempts replayed"
    )
    .expect("register retries_replayed_total")
});

pub static PROBES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "voice_pool_probes_total",
        "Total credential health probes performed"
    )
    .expect("register probes_total")
});

pub static CAPACITY_EXHAUSTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "voice_pool_capacity_exhausted_total",
        "Total allocations rejected for lack of pool capacity"
    )
    .expect("register capacity_exhausted_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
