use std::time::Duration;

use crate::interpolation::InterpolationConfig;
use crate::prediction::ReconciliationConfig;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub reconciliation: ReconciliationConfig,
    pub interpolation: InterpolationConfig,
    /// How long to wait before (re-)asking the server for a full state
    /// while the initialization gate is not yet ready.
    pub full_state_retry: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconciliation: ReconciliationConfig::default(),
            interpolation: InterpolationConfig::default(),
            full_state_retry: Duration::from_secs(3),
        }
    }
}
