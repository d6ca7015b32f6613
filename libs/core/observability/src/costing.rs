//! Costing engine metrics.

use metrics::{counter, gauge, histogram};

/// Costing metrics recorder
pub struct CostingMetrics;

impl CostingMetrics {
    /// Record one resolution pass over the catalog
    pub fn record_resolution(
        sub_recipes: usize,
        recipes: usize,
        warnings: usize,
        duration_ms: u64,
    ) {
        counter!("costing_resolutions_total").increment(1);
        histogram!("costing_resolution_duration_seconds").record(duration_ms as f64 / 1000.0);
        gauge!("costing_entities_resolved", "kind" => "sub_recipe").set(sub_recipes as f64);
        gauge!("costing_entities_resolved", "kind" => "recipe").set(recipes as f64);

        tracing::debug!(
            sub_recipes = sub_recipes,
            recipes = recipes,
            warnings = warnings,
            duration_ms = duration_ms,
            "Resolved catalog"
        );
    }

    /// Record a data-quality warning raised during resolution
    pub fn record_warning(kind: &'static str) {
        counter!("costing_warnings_total", "kind" => kind).increment(1);
    }

    /// Record a catalog write (`create`, `update`, `delete`)
    pub fn record_catalog_write(entity: &'static str, operation: &'static str) {
        counter!(
            "costing_catalog_writes_total",
            "entity" => entity,
            "operation" => operation
        )
        .increment(1);
    }

    pub fn set_average_margin(percent: f64) {
        gauge!("costing_average_margin_percent").set(percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        CostingMetrics::record_resolution(2, 3, 1, 5);
        CostingMetrics::record_warning("cycle_detected");
        CostingMetrics::record_catalog_write("recipe", "create");
        CostingMetrics::set_average_margin(42.0);
    }
}
