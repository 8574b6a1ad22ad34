use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub serial_port: String,
    pub baud_rate: u32,
    pub device_port: u16,
    pub serial_settle_ms: u64,
    pub socket_settle_ms: u64,
    pub response_timeout_ms: u64,
    pub drain_timeout_ms: u64,
}

impl TransportConfig {
    pub fn serial_settle(&self) -> Duration {
        Duration::from_millis(self.serial_settle_ms)
    }

    pub fn socket_settle(&self) -> Duration {
        Duration::from_millis(self.socket_settle_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            device_port: 4000,
            serial_settle_ms: 20,
            socket_settle_ms: 1,
            response_timeout_ms: 200,
            drain_timeout_ms: 500,
        }
    }
}
