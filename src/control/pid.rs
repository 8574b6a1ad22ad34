use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral_limit: Option<f64>,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.02,
            ki: 0.0,
            kd: 0.0,
            integral_limit: None,
        }
    }
}

// the derivative term works on the magnitude of the error change
#[derive(Debug)]
pub struct PidController {
    gains: PidGains,
    prev_error: f64,
    integral: f64,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            prev_error: 0.0,
            integral: 0.0,
        }
    }

    pub fn update(&mut self, error: f64) -> f64 {
        let proportional = error;
        self.integral += error;
        if let Some(limit) = self.gains.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }
        let derivative = (self.prev_error - error).abs();
        let output = self.gains.kp * proportional
            + self.gains.ki * self.integral
            + self.gains.kd * derivative;
        self.prev_error = error;
        round_millis(output)
    }

    pub fn reset(&mut self) {
        self.prev_error = 0.0;
        self.integral = 0.0;
    }
}

// outputs are degree commands; three decimals is all the device resolves
fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
