//! Observability utilities for the recipe costing workspace.
//!
//! This crate provides:
//! - Prometheus metrics recording and text rendering
//! - Costing metrics for resolution passes, data warnings and catalog writes
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, CostingMetrics};
//!
//! init_metrics();
//!
//! CostingMetrics::record_resolution(12, 40, 3, 2);
//! CostingMetrics::record_warning("dangling_reference");
//!
//! println!("{}", render_metrics());
//! ```

pub mod costing;

pub use costing::CostingMetrics;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup.
/// Returns the PrometheusHandle for rendering metrics.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition of everything recorded so far
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Resolution
    describe_counter!(
        "costing_resolutions_total",
        "Total catalog resolution passes"
    );
    describe_histogram!(
        "costing_resolution_duration_seconds",
        "Catalog resolution duration in seconds"
    );
    describe_gauge!(
        "costing_entities_resolved",
        "Entities priced in the last pass by kind"
    );

    // Data quality
    describe_counter!(
        "costing_warnings_total",
        "Data-quality warnings by kind"
    );

    // Catalog
    describe_counter!(
        "costing_catalog_writes_total",
        "Catalog writes by entity and operation"
    );

    // Pricing
    describe_gauge!(
        "costing_average_margin_percent",
        "Unweighted average margin across recipes"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_recorder() {
        if get_metrics_handle().is_none() {
            assert_eq!(render_metrics(), "# Metrics not initialized\n");
        }
    }
}
