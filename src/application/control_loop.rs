use std::future::Future;
use std::time::Duration;

use crate::application::control_cycle::{ControlCycleOrchestrator, CycleOutcome};
use crate::domains::logger::DynLogger;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub aborted: u64,
    pub targets_reached: u64,
    pub halted: bool,
    pub session_closed: bool,
}

impl LoopSummary {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        if !outcome.ok {
            self.aborted += 1;
        }
        if outcome.target_reached {
            self.targets_reached += 1;
        }
    }
}

/// Paces cycles at a fixed interval until shutdown or the last target is reached.
pub struct ControlLoop {
    orchestrator: ControlCycleOrchestrator,
    interval: Duration,
    logger: DynLogger,
}

impl ControlLoop {
    pub fn new(orchestrator: ControlCycleOrchestrator, interval: Duration, logger: DynLogger) -> Self {
        Self {
            orchestrator,
            interval,
            logger,
        }
    }

    pub fn orchestrator(&self) -> &ControlCycleOrchestrator {
        &self.orchestrator
    }

    /// Reads the synthesis service mode once; failures are reported, not fatal.
    pub async fn probe(&self) -> bool {
        let synthesis = self.orchestrator.synthesis();
        match synthesis.mode().await {
            Ok(mode) => {
                self.logger.info(&format!(
                    "synthesis service at {} reachable, mode {}",
                    synthesis.endpoint(),
                    mode
                ));
                true
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "synthesis service at {} not ready: {}",
                    synthesis.endpoint(),
                    e
                ));
                false
            }
        }
    }

    /// Runs exactly `count` cycles back to back without pacing.
    pub async fn run_cycles(&mut self, count: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(count);
        for _ in 0..count {
            let outcome = self.orchestrator.run_cycle().await;
            self.report(&outcome);
            let finished = outcome.finished;
            outcomes.push(outcome);
            if finished {
                break;
            }
        }
        outcomes
    }

    pub async fn run_until<F>(&mut self, shutdown: F) -> LoopSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = LoopSummary::default();

        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => {
                    self.logger.info("shutdown requested during cycle");
                    break;
                }
                outcome = self.orchestrator.run_cycle() => outcome,
            };
            self.report(&outcome);
            summary.record(&outcome);
            if outcome.finished {
                self.logger.info("last target reached, stopping");
                break;
            }

            let pause = self.interval.saturating_sub(outcome.elapsed);
            tokio::select! {
                _ = &mut shutdown => {
                    self.logger.info("shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        summary.halted = match self.orchestrator.halt().await {
            Ok(()) => true,
            Err(e) => {
                self.logger.error(&format!("failed to emit stop on shutdown: {}", e));
                false
            }
        };
        summary.session_closed = match self.orchestrator.close_session().await {
            Ok(()) => true,
            Err(e) => {
                self.logger.warn(&format!("could not close control session: {}", e));
                false
            }
        };
        self.logger.info(&format!(
            "control loop finished after {} cycle(s), {} aborted, {} target(s) reached",
            summary.cycles, summary.aborted, summary.targets_reached
        ));
        summary
    }

    fn report(&self, outcome: &CycleOutcome) {
        match &outcome.reason {
            None => self.logger.info(&format!(
                "cycle ok: {} (target #{}, {} ms)",
                outcome.action,
                outcome.target_index,
                outcome.elapsed.as_millis()
            )),
            Some(reason) => self.logger.warn(&format!(
                "cycle aborted: {} (target #{}, {} ms)",
                reason,
                outcome.target_index,
                outcome.elapsed.as_millis()
            )),
        }
    }
}
