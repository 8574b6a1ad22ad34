use std::marker::PhantomData;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BoundingBox, FrameSource, Observation, Perception, PerceptionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerAlgorithm {
    Csrt,
    Kcf,
    Mil,
}

impl TrackerAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerAlgorithm::Csrt => "csrt",
            TrackerAlgorithm::Kcf => "kcf",
            TrackerAlgorithm::Mil => "mil",
        }
    }

    pub fn all() -> [TrackerAlgorithm; 3] {
        [
            TrackerAlgorithm::Csrt,
            TrackerAlgorithm::Kcf,
            TrackerAlgorithm::Mil,
        ]
    }
}

impl std::str::FromStr for TrackerAlgorithm {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csrt" => Ok(TrackerAlgorithm::Csrt),
            "kcf" => Ok(TrackerAlgorithm::Kcf),
            "mil" => Ok(TrackerAlgorithm::Mil),
            other => Err(anyhow::anyhow!(
                "Unknown tracker algorithm: {} (available: csrt, kcf, mil)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerUpdate {
    pub found: bool,
    pub bounding_box: Option<BoundingBox>,
}

impl TrackerUpdate {
    pub fn found(bounding_box: BoundingBox) -> Self {
        Self {
            found: true,
            bounding_box: Some(bounding_box),
        }
    }

    pub fn lost() -> Self {
        Self {
            found: false,
            bounding_box: None,
        }
    }
}

pub trait VisualTracker<F>: Send {
    fn algorithm(&self) -> TrackerAlgorithm;
    fn initialize(&mut self, frame: &F, region: BoundingBox) -> Result<()>;
    fn update(&mut self, frame: &F) -> Result<TrackerUpdate>;
}

// adapts a frame stream plus a tracker into a perception source; the seed
// region is consumed by the first frame
pub struct TrackedSource<F, S, T> {
    frames: S,
    tracker: T,
    region: Option<BoundingBox>,
    _frame: PhantomData<fn() -> F>,
}

impl<F, S, T> TrackedSource<F, S, T>
where
    S: FrameSource<F>,
    T: VisualTracker<F>,
{
    pub fn new(frames: S, tracker: T, region: BoundingBox) -> Self {
        Self {
            frames,
            tracker,
            region: Some(region),
            _frame: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<F, S, T> PerceptionSource for TrackedSource<F, S, T>
where
    F: Send + Sync,
    S: FrameSource<F>,
    T: VisualTracker<F>,
{
    async fn next_observation(&mut self) -> Result<Perception> {
        let frame = match self.frames.next_frame().await? {
            Some(frame) => frame,
            None => return Ok(Perception::EndOfStream),
        };

        if let Some(region) = self.region.take() {
            self.tracker.initialize(&frame, region)?;
            debug!("Tracker {} seeded", self.tracker.algorithm().name());
            return Ok(Perception::Object(Observation::new(region)));
        }

        let update = self.tracker.update(&frame)?;
        match update.bounding_box {
            Some(bb) if update.found => Ok(Perception::Object(Observation::new(bb))),
            _ => Ok(Perception::Absent),
        }
    }
}
