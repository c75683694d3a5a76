//! # Prometheus Metrics
//!
//! Operational metrics for the node, scraped at `/metrics` on the metrics
//! port. Everything lives in a dedicated [`prometheus::Registry`] under the
//! `charity` namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Campaigns registered.
    pub campaigns_created_total: IntCounter,
    /// Contributions accepted.
    pub contributions_total: IntCounter,
    /// Campaigns finalized, by outcome.
    pub finalizations_total: IntCounterVec,
    /// Refunds paid.
    pub refunds_total: IntCounter,
    /// Calls rejected by the ledger or token, by error kind.
    pub rejected_calls_total: IntCounterVec,
    /// Number of campaigns in the ledger.
    pub campaigns: IntGauge,
    /// Latency of mutating RPC calls in seconds, sequencer wait included.
    pub call_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("charity".into()), None)?;

        let campaigns_created_total =
            IntCounter::new("campaigns_created_total", "Total number of campaigns created")?;
        registry.register(Box::new(campaigns_created_total.clone()))?;

        let contributions_total =
            IntCounter::new("contributions_total", "Total number of accepted contributions")?;
        registry.register(Box::new(contributions_total.clone()))?;

        let finalizations_total = IntCounterVec::new(
            Opts::new("finalizations_total", "Total number of finalized campaigns"),
            &["outcome"],
        )?;
        registry.register(Box::new(finalizations_total.clone()))?;

        let refunds_total = IntCounter::new("refunds_total", "Total number of refunds paid")?;
        registry.register(Box::new(refunds_total.clone()))?;

        let rejected_calls_total = IntCounterVec::new(
            Opts::new("rejected_calls_total", "Calls rejected, by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(rejected_calls_total.clone()))?;

        let campaigns = IntGauge::new("campaigns", "Number of campaigns in the ledger")?;
        registry.register(Box::new(campaigns.clone()))?;

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "Mutating RPC call latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(call_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            campaigns_created_total,
            contributions_total,
            finalizations_total,
            refunds_total,
            rejected_calls_total,
            campaigns,
            call_latency_seconds,
        })
    }

    /// Counts a call the ledger turned away.
    pub fn record_rejection(&self, kind: &str) {
        self.rejected_calls_total.with_label_values(&[kind]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
