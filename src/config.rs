//! Optimizer configuration.
//!
//! Every field has a default, so a partial JSON document only needs to
//! name what it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::TruckCatalog;
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub catalog: TruckCatalog,
    /// Loads below this utilization are candidates for compaction.
    pub min_utilization_percent: f64,
    /// Run the merge-compaction pass after first-fit packing.
    pub compaction: bool,
    /// Only orders with overlapping delivery windows share a load.
    pub respect_delivery_windows: bool,
    /// Upper bound on groups packed concurrently.
    pub max_parallel_groups: usize,
    /// Pickup deadline lead before the load's arrival deadline.
    pub pickup_lead_hours: i64,
    pub load_id_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            catalog: TruckCatalog::default(),
            min_utilization_percent: 60.0,
            compaction: true,
            respect_delivery_windows: true,
            max_parallel_groups: 4,
            pickup_lead_hours: 48,
            load_id_prefix: "LOAD_".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_groups == 0 {
            return Err(ConfigError::Invalid("max_parallel_groups must be at least 1".into()));
        }
        if !(0.0..=100.0).contains(&self.min_utilization_percent) {
            return Err(ConfigError::Invalid(
                "min_utilization_percent must be within 0..=100".into(),
            ));
        }
        if self.catalog.is_empty() {
            return Err(ConfigError::Invalid("catalog needs at least one truck type".into()));
        }
        if let Some(truck) = self
            .catalog
            .trucks()
            .iter()
            .find(|truck| !(truck.max_weight_lbs > 0.0 && truck.max_volume_cuft > 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "truck type `{}` needs positive capacities",
                truck.name
            )));
        }
        Ok(())
    }
}
