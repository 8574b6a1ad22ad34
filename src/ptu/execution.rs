use crate::protocol::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionState {
    pub success: bool,
    pub first_failure: bool,
}

impl ExecutionState {
    pub fn merge(self, other: ExecutionState) -> ExecutionState {
        ExecutionState {
            success: self.success && other.success,
            first_failure: self.first_failure || other.first_failure,
        }
    }
}

// tracks command health across attempts; a failure is "first" only when the
// previous attempt went through
#[derive(Debug)]
pub struct ExecutionTracker {
    prev_success: bool,
    total_failures: u64,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self {
            prev_success: true,
            total_failures: 0,
        }
    }

    pub fn record(&mut self, outcome: &Outcome) -> ExecutionState {
        let success = outcome.is_success();
        let first_failure = !success && self.prev_success;
        if !success {
            self.total_failures += 1;
        }
        self.prev_success = success;
        ExecutionState {
            success,
            first_failure,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.prev_success
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}
