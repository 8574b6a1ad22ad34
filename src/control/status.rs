use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Acquiring,
    Tracking,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopStatus {
    pub state: LoopState,
    pub track_id: Option<Uuid>,
    pub frames_processed: u64,
    pub commands_issued: u64,
    pub last_error: Option<(f64, f64)>,
    pub started_at: DateTime<Utc>,
}

impl LoopStatus {
    pub fn idle() -> Self {
        Self {
            state: LoopState::Idle,
            track_id: None,
            frames_processed: 0,
            commands_issued: 0,
            last_error: None,
            started_at: Utc::now(),
        }
    }
}
