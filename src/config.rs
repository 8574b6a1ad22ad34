use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::control::config::ControlConfig;
use crate::ptu::config::DriverConfig;
use crate::transport::config::TransportConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub driver: DriverConfig,
    pub control: ControlConfig,
}

impl AppConfig {
    // missing fields fall back to their defaults, so a config file only
    // needs to name what it overrides
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            anyhow::anyhow!("Config file not readable: {} ({})", path.display(), err)
        })?;
        let config = serde_json::from_str(&raw).map_err(|err| {
            anyhow::anyhow!("Config file not valid JSON: {} ({})", path.display(), err)
        })?;
        Ok(config)
    }
}
