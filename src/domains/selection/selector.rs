use serde::{Deserialize, Serialize};

use super::candidate::*;
use crate::common::{ControlError, ControlResult};
use crate::domains::localization::StateVector;
use crate::domains::logger::DynLogger;

/// Weight of the heading term in the state-delta metric.
pub const HEADING_WEIGHT: f64 = 0.5;
/// Weight of the velocity term in the state-delta metric.
pub const VELOCITY_WEIGHT: f64 = 0.1;
/// Distance multiplier for a candidate repeating the last control.
pub const CONTINUITY_BIAS: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    FirstContinuityMatch,
    NearestWithContinuityBias,
}

impl SelectionPolicy {
    fn entry_fields(&self) -> usize {
        match self {
            SelectionPolicy::FirstContinuityMatch => PLAIN_ENTRY_FIELDS,
            SelectionPolicy::NearestWithContinuityBias => ANCHORED_ENTRY_FIELDS,
        }
    }
}

/// Memory carried from one completed cycle to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub last_action: Option<ActionCandidate>,
}

impl SelectionState {
    pub fn reset(&mut self) {
        self.last_action = None;
    }
}

pub struct ActionSelector {
    policy: SelectionPolicy,
    logger: DynLogger,
}

impl ActionSelector {
    pub fn new(policy: SelectionPolicy, logger: DynLogger) -> Self {
        Self { policy, logger }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Picks one candidate from `menu` and records it as the last action.
    pub fn select(
        &self,
        menu: &str,
        state: &StateVector,
        selection: &mut SelectionState,
    ) -> ControlResult<ActionCandidate> {
        if menu.trim().is_empty() {
            return Err(ControlError::EmptyMenu);
        }
        let parsed = parse_menu(menu, self.policy.entry_fields());
        for (idx, entry, rejection) in &parsed.rejected {
            self.logger.warn(&format!(
                "skipping action entry {} '{}': {:?}",
                idx, entry, rejection
            ));
        }
        if parsed.candidates.is_empty() {
            return Err(ControlError::NoValidActions {
                entries: parsed.entries,
            });
        }

        let last = selection.last_action.as_ref();
        let chosen = match self.policy {
            SelectionPolicy::FirstContinuityMatch => first_continuity_match(&parsed.candidates, last),
            SelectionPolicy::NearestWithContinuityBias => {
                nearest_with_continuity_bias(&parsed.candidates, state, last)
            }
        };
        selection.last_action = Some(chosen);
        Ok(chosen)
    }
}

/// First candidate whose throttle keeps the last action's direction, else the first candidate.
pub fn first_continuity_match(
    candidates: &[ActionCandidate],
    last: Option<&ActionCandidate>,
) -> ActionCandidate {
    last.and_then(|last| candidates.iter().find(|c| c.same_direction(last)))
        .copied()
        .unwrap_or(candidates[0])
}

/// Closest anchored candidate under the weighted metric, biased towards repeating the last control.
pub fn nearest_with_continuity_bias(
    candidates: &[ActionCandidate],
    state: &StateVector,
    last: Option<&ActionCandidate>,
) -> ActionCandidate {
    let score = |candidate: &ActionCandidate| {
        let anchor = candidate.anchor.unwrap_or(*state);
        let distance = state_distance(state, &anchor);
        match last {
            Some(last) if candidate.same_control(last) => distance * CONTINUITY_BIAS,
            _ => distance,
        }
    };
    let mut best = candidates[0];
    let mut best_score = score(&best);
    for candidate in &candidates[1..] {
        let s = score(candidate);
        if s < best_score {
            best = *candidate;
            best_score = s;
        }
    }
    best
}

/// `sqrt(dx² + dy² + 0.5·dθ² + 0.1·dv²)`.
pub fn state_distance(a: &StateVector, b: &StateVector) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dtheta = a.heading - b.heading;
    let dv = a.velocity - b.velocity;
    (dx * dx + dy * dy + HEADING_WEIGHT * dtheta * dtheta + VELOCITY_WEIGHT * dv * dv).sqrt()
}
