//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{GridclearError, Result, constants};

/// Configuration shared by every market in a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of equally spaced price samples used when computing the
    /// published per-side aggregate curves. Higher values trade aggregation
    /// cost for interpolation accuracy; the clearing intersection itself
    /// always uses exact (breakpoint-union) aggregation.
    pub aggregate_resolution: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aggregate_resolution: constants::DEFAULT_AGGREGATE_RESOLUTION,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.aggregate_resolution < constants::MIN_AGGREGATE_RESOLUTION {
            return Err(GridclearError::InvalidResolution(self.aggregate_resolution));
        }
        Ok(())
    }
}
