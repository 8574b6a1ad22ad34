use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::device_state::StepMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub step_mode: StepMode,
    pub mode_settle_ms: u64,
    pub reset_settle_ms: u64,
    pub await_timeout_ms: u64,
}

impl DriverConfig {
    pub fn mode_settle(&self) -> Duration {
        Duration::from_millis(self.mode_settle_ms)
    }

    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms)
    }

    pub fn await_timeout(&self) -> Duration {
        Duration::from_millis(self.await_timeout_ms)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step_mode: StepMode::Eighth,
            mode_settle_ms: 500,
            reset_settle_ms: 2000,
            await_timeout_ms: 10_000,
        }
    }
}
