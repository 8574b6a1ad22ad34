use crate::ptu::device_state::{Axis, StepMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtuCommand {
    NetworkInfo,
    SetStepMode(Axis, StepMode),
    Reset(Axis),
    MoveTo(Axis, i32),
    MoveBy(Axis, i32),
    Await,
}

impl PtuCommand {
    pub fn render(&self) -> String {
        match self {
            PtuCommand::NetworkInfo => "NI".to_string(),
            PtuCommand::SetStepMode(axis, mode) => {
                let axis_letter = match axis {
                    Axis::Pan => 'P',
                    Axis::Tilt => 'T',
                };
                let mode_letter = match mode {
                    StepMode::Half => 'H',
                    StepMode::Quarter => 'Q',
                    StepMode::Eighth => 'E',
                };
                format!("W{}{}", axis_letter, mode_letter)
            }
            PtuCommand::Reset(Axis::Pan) => "RP".to_string(),
            PtuCommand::Reset(Axis::Tilt) => "RT".to_string(),
            PtuCommand::MoveTo(Axis::Pan, position) => format!("PP{}", position),
            PtuCommand::MoveTo(Axis::Tilt, position) => format!("TP{}", position),
            PtuCommand::MoveBy(Axis::Pan, positions) => format!("PO{}", positions),
            PtuCommand::MoveBy(Axis::Tilt, positions) => format!("TO{}", positions),
            PtuCommand::Await => "A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_step_mode_commands() {
        assert_eq!(PtuCommand::SetStepMode(Axis::Pan, StepMode::Half).render(), "WPH");
        assert_eq!(PtuCommand::SetStepMode(Axis::Tilt, StepMode::Half).render(), "WTH");
        assert_eq!(PtuCommand::SetStepMode(Axis::Pan, StepMode::Quarter).render(), "WPQ");
        assert_eq!(PtuCommand::SetStepMode(Axis::Tilt, StepMode::Quarter).render(), "WTQ");
        assert_eq!(PtuCommand::SetStepMode(Axis::Pan, StepMode::Eighth).render(), "WPE");
        assert_eq!(PtuCommand::SetStepMode(Axis::Tilt, StepMode::Eighth).render(), "WTE");
    }

    #[test]
    fn test_render_movement_commands() {
        assert_eq!(PtuCommand::MoveTo(Axis::Pan, 100).render(), "PP100");
        assert_eq!(PtuCommand::MoveTo(Axis::Tilt, -40).render(), "TP-40");
        assert_eq!(PtuCommand::MoveBy(Axis::Pan, -3).render(), "PO-3");
        assert_eq!(PtuCommand::MoveBy(Axis::Tilt, 25).render(), "TO25");
    }

    #[test]
    fn test_render_control_commands() {
        assert_eq!(PtuCommand::NetworkInfo.render(), "NI");
        assert_eq!(PtuCommand::Reset(Axis::Pan).render(), "RP");
        assert_eq!(PtuCommand::Reset(Axis::Tilt).render(), "RT");
        assert_eq!(PtuCommand::Await.render(), "A");
    }
}
