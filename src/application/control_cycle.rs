use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{ControlError, ControlResult, Deadline, ErrorKind};
use crate::config::{Config, ProtocolVariant};
use crate::domains::actuation::{Actuator, ControlAction};
use crate::domains::geometry::{Covering, RegionKind, ThetaCalibration};
use crate::domains::localization::{LocalizationSource, RegionSet, StateVector};
use crate::domains::logger::DynLogger;
use crate::domains::selection::{ActionSelector, SelectionState};
use crate::domains::synthesis::SynthesisProtocolClient;

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub robot: String,
    pub covering: Covering,
    pub protocol: ProtocolVariant,
    pub parenthesize_state: bool,
    /// Bound on every remote wait within one cycle.
    pub cycle_deadline: Duration,
    pub stop_after_last_target: bool,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            robot: config.robot.name.clone(),
            covering: config.control.covering,
            protocol: config.synthesis.protocol,
            parenthesize_state: config.control.parenthesize_state,
            cycle_deadline: config.control.cycle_deadline(),
            stop_after_last_target: config.control.stop_after_last_target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStep {
    ReadPose,
    BuildRegions,
    RequestSynthesisAndControls,
    SelectAction,
    Emit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbortReason {
    pub step: CycleStep,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} failed ({:?}): {}", self.step, self.kind, self.message)
    }
}

/// Structured result of one cycle. Aborted cycles always carry a stop action.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub ok: bool,
    pub action: ControlAction,
    pub reason: Option<AbortReason>,
    /// Target index in effect when the cycle started.
    pub target_index: usize,
    pub target_reached: bool,
    /// Set when the last target was reached and the loop is configured to stop there.
    pub finished: bool,
    pub elapsed: Duration,
}

struct Decision {
    action: ControlAction,
    target_reached: bool,
    finished: bool,
}

impl Decision {
    fn drive(action: ControlAction) -> Self {
        Self {
            action,
            target_reached: false,
            finished: false,
        }
    }
}

type StepResult<T> = Result<T, (CycleStep, ControlError)>;

fn at(step: CycleStep) -> impl FnOnce(ControlError) -> (CycleStep, ControlError) {
    move |e| (step, e)
}

/// One poll cycle: read pose, build regions, run the synthesis protocol, select, emit.
///
/// Owns the only state that survives between cycles: the selection memory and the
/// index of the target currently being driven to.
pub struct ControlCycleOrchestrator {
    localization: Arc<dyn LocalizationSource>,
    synthesis: SynthesisProtocolClient,
    selector: ActionSelector,
    calibration: ThetaCalibration,
    actuator: Arc<dyn Actuator>,
    settings: CycleSettings,
    selection: SelectionState,
    curr_target: usize,
    logger: DynLogger,
}

impl ControlCycleOrchestrator {
    pub fn new(
        localization: Arc<dyn LocalizationSource>,
        synthesis: SynthesisProtocolClient,
        selector: ActionSelector,
        calibration: ThetaCalibration,
        actuator: Arc<dyn Actuator>,
        settings: CycleSettings,
        logger: DynLogger,
    ) -> Self {
        Self {
            localization,
            synthesis,
            selector,
            calibration,
            actuator,
            settings,
            selection: SelectionState::default(),
            curr_target: 0,
            logger,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn current_target(&self) -> usize {
        self.curr_target
    }

    pub fn synthesis(&self) -> &SynthesisProtocolClient {
        &self.synthesis
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        let target_index = self.curr_target;

        let (decision, mut reason) = match self.decide().await {
            Ok(decision) => (decision, None),
            Err((step, err)) => {
                self.logger.warn(&format!("cycle aborted at {:?}: {}", step, err));
                let reason = AbortReason {
                    step,
                    kind: err.kind(),
                    message: err.to_string(),
                };
                (Decision::drive(ControlAction::Stop), Some(reason))
            }
        };

        let mut action = decision.action;
        if let Err(err) = self.actuator.emit(&action).await {
            self.logger.error(&format!("failed to emit {}: {}", action, err));
            if !action.is_stop() {
                action = ControlAction::Stop;
                if let Err(stop_err) = self.actuator.emit(&action).await {
                    self.logger.error(&format!("failed to emit stop: {}", stop_err));
                }
            }
            reason.get_or_insert(AbortReason {
                step: CycleStep::Emit,
                kind: err.kind(),
                message: err.to_string(),
            });
        }

        CycleOutcome {
            ok: reason.is_none(),
            action,
            reason,
            target_index,
            target_reached: decision.target_reached,
            finished: decision.finished,
            elapsed: started.elapsed(),
        }
    }

    /// Leaves the robot stopped; the loop calls this once on shutdown.
    pub async fn halt(&self) -> ControlResult<()> {
        self.actuator.emit(&ControlAction::Stop).await
    }

    /// Releases the remote control session; called once when the loop shuts down.
    pub async fn close_session(&self) -> ControlResult<()> {
        let deadline = Deadline::after(self.settings.cycle_deadline);
        self.synthesis.close_session(&deadline).await
    }

    async fn decide(&mut self) -> StepResult<Decision> {
        // ReadPose
        let scene = self
            .localization
            .snapshot()
            .await
            .map_err(at(CycleStep::ReadPose))?;
        let pose = scene
            .robot_pose(&self.settings.robot)
            .map_err(at(CycleStep::ReadPose))?;
        let report = self.calibration.calibrate_with_report(pose.heading);
        if report.is_significant() {
            let bound = report
                .clamped
                .map(|b| format!(" (clamped to {:?})", b))
                .unwrap_or_default();
            self.logger.info(&format!(
                "heading calibrated {:.6} -> {:.6}{}",
                report.original, report.calibrated, bound
            ));
        }
        let state = pose.with_heading(report.calibrated).state();

        // BuildRegions
        let targets = scene.regions(RegionKind::Target, self.settings.covering);
        let obstacles = scene.regions(RegionKind::Obstacle, self.settings.covering);
        self.log_rejected(&targets);
        self.log_rejected(&obstacles);
        if targets.is_empty() {
            return Err((
                CycleStep::BuildRegions,
                ControlError::malformed("no tracked targets in the scene"),
            ));
        }
        if self.curr_target >= targets.regions.len() {
            self.logger.warn(&format!(
                "target index {} out of range (0-{}), restarting from 0",
                self.curr_target,
                targets.regions.len() - 1
            ));
            self.curr_target = 0;
        }
        let target = &targets.regions[self.curr_target];

        if target.region.contains_position(state.x, state.y) {
            return Ok(self.advance_target(targets.regions.len(), &target.name, &state));
        }

        // RequestSynthesisAndControls
        let deadline = Deadline::after(self.settings.cycle_deadline);
        let state_wire = state.to_wire(self.settings.parenthesize_state);
        let target_wire = target.region.to_string();
        let obstacles_wire = obstacles.stacked();
        self.logger.info(&format!(
            "target #{} ({}), {} obstacle(s), state {}",
            self.curr_target,
            target.name,
            obstacles.regions.len(),
            state_wire
        ));
        let menu = match self.settings.protocol {
            ProtocolVariant::Combined => {
                self.synthesis
                    .synthesize_and_get_controls(&obstacles_wire, &target_wire, &state_wire, &deadline)
                    .await
            }
            ProtocolVariant::TwoPhase => {
                match self
                    .synthesis
                    .synthesize_controller(&obstacles_wire, &target_wire, true, &deadline)
                    .await
                {
                    Ok(()) => self.synthesis.get_controls(&state_wire, true, &deadline).await,
                    Err(e) => Err(e),
                }
            }
        }
        .map_err(at(CycleStep::RequestSynthesisAndControls))?;

        // SelectAction
        let chosen = self
            .selector
            .select(&menu, &state, &mut self.selection)
            .map_err(at(CycleStep::SelectAction))?;
        self.logger.info(&format!(
            "selected steering={} throttle={}",
            chosen.steering, chosen.throttle
        ));
        Ok(Decision::drive(chosen.into()))
    }

    fn advance_target(&mut self, target_count: usize, name: &str, state: &StateVector) -> Decision {
        self.logger.info(&format!(
            "reached target #{} ({}) at ({:.4}, {:.4})",
            self.curr_target, name, state.x, state.y
        ));
        self.curr_target += 1;
        let mut finished = false;
        if self.curr_target >= target_count {
            self.curr_target = 0;
            finished = self.settings.stop_after_last_target;
        }
        Decision {
            action: ControlAction::Stop,
            target_reached: true,
            finished,
        }
    }

    fn log_rejected(&self, set: &RegionSet) {
        for (name, err) in &set.rejected {
            self.logger.warn(&format!("ignoring {} this cycle: {}", name, err));
        }
    }
}
