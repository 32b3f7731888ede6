//! Prometheus metrics exposition
//!
//! - `authcode_logins_total` (counter)
//! - `authcode_token_exchanges_total` (counter): label `status`, the token
//!   endpoint's HTTP status or `error` when no response was read
//! - `authcode_token_exchange_duration_seconds` (histogram): label `status`
//!
//! Plain atomic counters back the `/health` JSON so it works without a
//! global recorder installed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const EXCHANGE_DURATION: &str = "authcode_token_exchange_duration_seconds";

/// Buckets from 5ms up to the longest plausible outbound timeout.
const EXCHANGE_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(EXCHANGE_DURATION.to_string()), EXCHANGE_BUCKETS)
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Handle backed by a recorder that is not installed globally.
#[cfg(test)]
pub fn isolated_handle() -> PrometheusHandle {
    builder().unwrap().build_recorder().handle()
}

pub fn record_login() {
    metrics::counter!("authcode_logins_total").increment(1);
}

/// Record one token exchange. `status` is `None` when the exchange failed
/// before a response body was read.
pub fn record_exchange(status: Option<u16>, duration_secs: f64) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    metrics::counter!("authcode_token_exchanges_total", "status" => status.clone()).increment(1);
    metrics::histogram!(EXCHANGE_DURATION, "status" => status).record(duration_secs);
}

/// Counters reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceStats {
    pub callbacks_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self {
            callbacks_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn callback_served(&self) {
        self.callbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }
}
