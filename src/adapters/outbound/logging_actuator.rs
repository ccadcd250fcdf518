use async_trait::async_trait;
use std::sync::Mutex;

use crate::common::ControlResult;
use crate::domains::actuation::{Actuator, ControlAction};
use crate::domains::logger::DynLogger;

/// Reports each chosen action instead of driving hardware.
pub struct LoggingActuator {
    robot: String,
    logger: DynLogger,
    last: Mutex<Option<ControlAction>>,
}

impl LoggingActuator {
    pub fn new(robot: impl Into<String>, logger: DynLogger) -> Self {
        Self {
            robot: robot.into(),
            logger,
            last: Mutex::new(None),
        }
    }

    pub fn last_emitted(&self) -> Option<ControlAction> {
        self.last.lock().ok().and_then(|g| *g)
    }
}

#[async_trait]
impl Actuator for LoggingActuator {
    async fn emit(&self, action: &ControlAction) -> ControlResult<()> {
        self.logger.info(&format!("{} <- {}", self.robot, action));
        if let Ok(mut last) = self.last.lock() {
            *last = Some(*action);
        }
        Ok(())
    }
}
