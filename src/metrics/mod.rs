//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Fee estimation and cache behavior
//! - Transaction submission outcomes
//! - Confirmation latency

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec,
    CounterVec, Encoder, GaugeVec, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Fee metrics
    pub static ref FEE_CACHE_HITS: CounterVec = register_counter_vec!(
        "gateway_fee_cache_hits_total",
        "Fee estimates served from the cache",
        &["network"]
    ).unwrap();

    pub static ref FEE_CACHE_MISSES: CounterVec = register_counter_vec!(
        "gateway_fee_cache_misses_total",
        "Fee estimates refreshed from the node",
        &["network"]
    ).unwrap();

    pub static ref FEE_ESTIMATE_GWEI: GaugeVec = register_gauge_vec!(
        "gateway_fee_estimate_gwei",
        "Most recent fee estimate in gwei",
        &["network"]
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "gateway_transactions_submitted_total",
        "Total transactions broadcast",
        &["network"]
    ).unwrap();

    pub static ref TX_CONFIRMED: CounterVec = register_counter_vec!(
        "gateway_transactions_confirmed_total",
        "Total transactions confirmed successfully",
        &["network"]
    ).unwrap();

    pub static ref TX_REVERTED: CounterVec = register_counter_vec!(
        "gateway_transactions_reverted_total",
        "Total transactions mined but reverted",
        &["network"]
    ).unwrap();

    pub static ref TX_FAILED: CounterVec = register_counter_vec!(
        "gateway_transactions_failed_total",
        "Total transactions failed before or during confirmation",
        &["network", "kind"]
    ).unwrap();

    pub static ref CONFIRM_LATENCY: HistogramVec = register_histogram_vec!(
        "gateway_confirmation_latency_seconds",
        "Latency from submission start to mined receipt",
        &["network"],
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap_or_default();
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_fee_cache_hit(network: &str) {
    FEE_CACHE_HITS.with_label_values(&[network]).inc();
}

pub fn record_fee_cache_miss(network: &str) {
    FEE_CACHE_MISSES.with_label_values(&[network]).inc();
}

pub fn record_fee_estimate(network: &str, gas_price_gwei: f64) {
    FEE_ESTIMATE_GWEI
        .with_label_values(&[network])
        .set(gas_price_gwei);
}

pub fn record_tx_submitted(network: &str) {
    TX_SUBMITTED.with_label_values(&[network]).inc();
}

pub fn record_tx_confirmed(network: &str) {
    TX_CONFIRMED.with_label_values(&[network]).inc();
}

pub fn record_tx_reverted(network: &str) {
    TX_REVERTED.with_label_values(&[network]).inc();
}

pub fn record_tx_failed(network: &str, kind: &str) {
    TX_FAILED.with_label_values(&[network, kind]).inc();
}

pub fn record_confirm_latency(network: &str, latency_secs: f64) {
    CONFIRM_LATENCY
        .with_label_values(&[network])
        .observe(latency_secs);
}
