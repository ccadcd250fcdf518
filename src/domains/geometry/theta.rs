use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

pub const DEFAULT_THETA_MIN: f64 = -1.7;
pub const DEFAULT_THETA_MAX: f64 = 1.7;
pub const DEFAULT_RECALIBRATION_MAX: f64 = 3.2;

/// Deltas below this are not worth reporting.
const REPORT_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPolicy {
    /// Wrap, then clamp into the envelope.
    #[default]
    Normalize,
    /// Wrap, rescale the full range into the envelope, then clamp.
    Recalibrate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeBound {
    Min,
    Max,
}

/// What calibration did to one heading value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationReport {
    pub original: f64,
    pub calibrated: f64,
    pub clamped: Option<EnvelopeBound>,
}

impl CalibrationReport {
    pub fn delta(&self) -> f64 {
        self.calibrated - self.original
    }

    pub fn is_significant(&self) -> bool {
        self.delta().abs() > REPORT_EPSILON || self.clamped.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaCalibration {
    pub policy: CalibrationPolicy,
    pub theta_min: f64,
    pub theta_max: f64,
    pub recalibration_max: f64,
}

impl Default for ThetaCalibration {
    fn default() -> Self {
        Self {
            policy: CalibrationPolicy::Normalize,
            theta_min: DEFAULT_THETA_MIN,
            theta_max: DEFAULT_THETA_MAX,
            recalibration_max: DEFAULT_RECALIBRATION_MAX,
        }
    }
}

impl ThetaCalibration {
    pub fn new(policy: CalibrationPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    pub fn calibrate(&self, theta: f64) -> f64 {
        self.calibrate_with_report(theta).calibrated
    }

    pub fn calibrate_with_report(&self, theta: f64) -> CalibrationReport {
        let scaled = match self.policy {
            CalibrationPolicy::Normalize => wrap_angle(theta),
            CalibrationPolicy::Recalibrate => {
                // The full original range is already in the frame being compressed.
                let in_range = if theta.abs() <= self.recalibration_max {
                    theta
                } else {
                    wrap_angle(theta)
                };
                in_range / self.recalibration_max * self.theta_max
            }
        };
        let (calibrated, clamped) = self.clamp(scaled);
        CalibrationReport {
            original: theta,
            calibrated,
            clamped,
        }
    }

    fn clamp(&self, theta: f64) -> (f64, Option<EnvelopeBound>) {
        if theta > self.theta_max {
            (self.theta_max, Some(EnvelopeBound::Max))
        } else if theta < self.theta_min {
            (self.theta_min, Some(EnvelopeBound::Min))
        } else {
            (theta, None)
        }
    }
}

/// Wraps into `(-π, π]`. Values already inside are returned bit-for-bit.
pub fn wrap_angle(theta: f64) -> f64 {
    if theta > -PI && theta <= PI {
        return theta;
    }
    let wrapped = (theta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}
