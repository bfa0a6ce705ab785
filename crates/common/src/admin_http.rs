//! Out-of-band admin HTTP endpoint
//!
//! Runs on its own thread and runtime so `/healthz` and `/metrics` stay
//! responsive even if the main server is saturated. Metrics encoding is
//! supplied by the caller.

use std::thread;
use axum::http::StatusCode;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::runtime::Builder;
use tracing::info;

type MetricsFn = fn() -> (StatusCode, String);

async fn healthz() -> &'static str { "OK" }

/// Spawn the admin endpoint on `addr`, serving liveness and the caller's
/// metrics encoder.
pub fn spawn_admin_server(addr: &str, metrics_fn: MetricsFn) {
    let addr = addr.to_string();
    thread::spawn(move || {
        let rt = Builder::new_multi_thread().enable_all().build().expect("build admin runtime");
        rt.block_on(async move {
            let router = Router::new()
                .route("/healthz", get(healthz))
                .route("/metrics", get(move || async move { metrics_fn() }));
            let listener = TcpListener::bind(&addr).await.expect("bind admin");
            info!(%addr, "admin endpoint listening");
            axum::serve(listener, router).await.expect("serve admin");
        });
    });
}
