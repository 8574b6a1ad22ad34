use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Pan,
    Tilt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    Half,
    Quarter,
    Eighth,
}

impl StepMode {
    // degrees of travel represented by a single device position
    pub fn resolution(&self) -> f64 {
        match self {
            StepMode::Half => 0.02,
            StepMode::Quarter => 0.01,
            StepMode::Eighth => 0.005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSelection {
    pub pan: bool,
    pub tilt: bool,
}

impl AxisSelection {
    pub fn both() -> Self {
        Self {
            pan: true,
            tilt: true,
        }
    }

    pub fn only(axis: Axis) -> Self {
        match axis {
            Axis::Pan => Self {
                pan: true,
                tilt: false,
            },
            Axis::Tilt => Self {
                pan: false,
                tilt: true,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.pan && !self.tilt
    }
}

#[derive(Debug, Clone)]
pub struct DeviceState {
    step_mode: StepMode,
    pan_position: i32,
    tilt_position: i32,
}

impl DeviceState {
    // the unit powers up in half-step mode
    pub fn new() -> Self {
        Self {
            step_mode: StepMode::Half,
            pan_position: 0,
            tilt_position: 0,
        }
    }

    pub fn step_mode(&self) -> StepMode {
        self.step_mode
    }

    pub fn set_step_mode(&mut self, mode: StepMode) {
        self.step_mode = mode;
    }

    pub fn resolution(&self) -> f64 {
        self.step_mode.resolution()
    }

    // truncates toward zero
    pub fn degrees_to_steps(&self, angle: f64) -> i32 {
        (angle / self.resolution()) as i32
    }

    pub fn position(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Pan => self.pan_position,
            Axis::Tilt => self.tilt_position,
        }
    }

    pub fn set_position(&mut self, axis: Axis, position: i32) {
        match axis {
            Axis::Pan => self.pan_position = position,
            Axis::Tilt => self.tilt_position = position,
        }
    }

    pub fn offset_position(&mut self, axis: Axis, positions: i32) {
        match axis {
            Axis::Pan => self.pan_position += positions,
            Axis::Tilt => self.tilt_position += positions,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}
