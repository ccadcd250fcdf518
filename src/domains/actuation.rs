use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::ControlResult;
use crate::domains::selection::ActionCandidate;

/// What a cycle hands to the actuation side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlAction {
    Stop,
    Drive { steering: f64, throttle: f64 },
    /// Symbolic control input chosen by index.
    Symbolic { control: f64 },
}

impl ControlAction {
    pub fn is_stop(&self) -> bool {
        matches!(self, ControlAction::Stop)
    }
}

impl From<ActionCandidate> for ControlAction {
    fn from(candidate: ActionCandidate) -> Self {
        match candidate.control {
            Some(control) => ControlAction::Symbolic { control },
            None => ControlAction::Drive {
                steering: candidate.steering,
                throttle: candidate.throttle,
            },
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Stop => f.write_str("stop"),
            ControlAction::Drive { steering, throttle } => {
                write!(f, "steering = {}, throttle = {}", steering, throttle)
            }
            ControlAction::Symbolic { control } => write!(f, "control = {}", control),
        }
    }
}

/// Port to whatever moves the robot.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn emit(&self, action: &ControlAction) -> ControlResult<()>;
}
