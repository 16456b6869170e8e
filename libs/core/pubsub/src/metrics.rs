//! Prometheus metrics for the event bus

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Later calls are no-ops.
///
/// Installation fails if another recorder was set first; that is logged and
/// metrics then go to the other recorder.
pub fn init_metrics() {
    if PROMETHEUS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_ok() {
                info!("Prometheus metrics initialized");
            }
        }
        Err(e) => warn!(error = %e, "Failed to install Prometheus recorder"),
    }
}

/// Prometheus text exposition, or `None` before [`init_metrics`].
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Counters for one subscription, labelled by channel.
#[derive(Debug, Clone)]
pub(crate) struct SubscriberMetrics {
    channel: String,
}

impl SubscriberMetrics {
    pub(crate) fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub(crate) fn message_received(&self) {
        counter!("pubsub_messages_received_total", "channel" => self.channel.clone()).increment(1);
    }

    pub(crate) fn decode_failed(&self) {
        counter!("pubsub_decode_failures_total", "channel" => self.channel.clone()).increment(1);
    }

    pub(crate) fn handler_failed(&self, handler: &'static str) {
        counter!(
            "pubsub_handler_failures_total",
            "channel" => self.channel.clone(),
            "handler" => handler
        )
        .increment(1);
    }

    pub(crate) fn reconnect(&self) {
        counter!("pubsub_reconnects_total", "channel" => self.channel.clone()).increment(1);
    }
}
