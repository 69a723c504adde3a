//! Prometheus export for the `metrics` facade used by the HTTP middleware.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HTTP_METRICS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Installs the global Prometheus recorder. Only the first call installs;
/// later calls are no-ops.
pub fn init_http_metrics() {
    HTTP_METRICS.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    });
}

/// Everything recorded through the facade, in the Prometheus text format.
/// Empty until [`init_http_metrics`] has run.
pub fn render_http_metrics() -> String {
    HTTP_METRICS
        .get()
        .and_then(Option::as_ref)
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
