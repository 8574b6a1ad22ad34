use serde::{Deserialize, Serialize};

use super::pid::PidGains;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn center(&self) -> (f64, f64) {
        ((self.width / 2) as f64, (self.height / 2) as f64)
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub pan_gains: PidGains,
    pub tilt_gains: PidGains,
    // squared-pixel threshold an error must exceed before a move is issued
    pub dead_zone: f64,
    pub frame: FrameGeometry,
    pub reset_on_loss: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            pan_gains: PidGains::default(),
            tilt_gains: PidGains::default(),
            dead_zone: 100.0,
            frame: FrameGeometry::default(),
            reset_on_loss: false,
        }
    }
}
