pub mod tracker;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    // detector output comes as corner coordinates in row-major order
    pub fn from_corners(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self {
            x: xmin,
            y: ymin,
            width: xmax - xmin,
            height: ymax - ymin,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub bounding_box: BoundingBox,
    pub confidence: Option<f64>,
    pub label: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            confidence: None,
            label: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone)]
pub enum Perception {
    Object(Observation),
    Absent,
    EndOfStream,
}

#[async_trait::async_trait]
pub trait PerceptionSource: Send {
    async fn next_observation(&mut self) -> Result<Perception>;
}

#[async_trait::async_trait]
pub trait FrameSource<F>: Send {
    async fn next_frame(&mut self) -> Result<Option<F>>;
}
