use serde::{Deserialize, Serialize};

use crate::common::{ControlError, ControlResult};

/// Literal the localization service reports for an object it cannot see.
pub const UNTRACKED: &str = "untracked";

/// Fields a region sample must carry: id, x, y, heading, velocity, width, height.
pub const REGION_SAMPLE_FIELDS: usize = 7;
/// Fields a robot sample must carry: id, x, y, heading.
pub const POSE_SAMPLE_FIELDS: usize = 4;

const X: usize = 1;
const Y: usize = 2;
const HEADING: usize = 3;
const VELOCITY: usize = 4;
const WIDTH: usize = 5;
const HEIGHT: usize = 6;

/// Raw sample as received from localization, before any numeric validation.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedSample {
    Untracked,
    Fields(Vec<String>),
}

impl TrackedSample {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == UNTRACKED {
            return TrackedSample::Untracked;
        }
        TrackedSample::Fields(raw.split(',').map(|f| f.trim().to_string()).collect())
    }

    pub fn is_tracked(&self) -> bool {
        matches!(self, TrackedSample::Fields(_))
    }

    /// Parses the first `required` fields as numbers. Any failure rejects the whole sample.
    pub fn numeric_fields(&self, required: usize) -> ControlResult<Vec<f64>> {
        let fields = match self {
            TrackedSample::Untracked => return Err(ControlError::malformed("object is untracked")),
            TrackedSample::Fields(fields) => fields,
        };
        if fields.len() < required {
            return Err(ControlError::malformed(format!(
                "expected at least {} fields, got {}",
                required,
                fields.len()
            )));
        }
        fields[..required]
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                finite(field).ok_or_else(|| {
                    ControlError::malformed(format!("field {} is not numeric: '{}'", idx, field))
                })
            })
            .collect()
    }

    /// Centre and extent of a tracked region.
    pub fn footprint(&self) -> ControlResult<Footprint> {
        let values = self.numeric_fields(REGION_SAMPLE_FIELDS)?;
        Ok(Footprint {
            x: values[X],
            y: values[Y],
            width: values[WIDTH],
            height: values[HEIGHT],
        })
    }

    /// Robot pose. Velocity is optional; when present it must be numeric.
    pub fn pose(&self) -> ControlResult<Pose> {
        let values = self.numeric_fields(POSE_SAMPLE_FIELDS)?;
        let velocity = match self {
            TrackedSample::Fields(fields) if fields.len() > VELOCITY => {
                let raw = &fields[VELOCITY];
                Some(finite(raw).ok_or_else(|| {
                    ControlError::malformed(format!("velocity is not numeric: '{}'", raw))
                })?)
            }
            _ => None,
        };
        Ok(Pose {
            x: values[X],
            y: values[Y],
            heading: values[HEADING],
            velocity,
        })
    }
}

/// `NaN` and the infinities parse as `f64` but are not usable coordinates.
fn finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub velocity: Option<f64>,
}

impl Pose {
    pub fn with_heading(self, heading: f64) -> Self {
        Self { heading, ..self }
    }

    pub fn state(&self) -> StateVector {
        StateVector {
            x: self.x,
            y: self.y,
            heading: self.heading,
            velocity: self.velocity.unwrap_or(0.0),
        }
    }
}

/// Robot state as the synthesis service consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub velocity: f64,
}

impl StateVector {
    pub const ORIGIN: StateVector = StateVector {
        x: 0.0,
        y: 0.0,
        heading: 0.0,
        velocity: 0.0,
    };

    /// `x, y, heading, velocity` with six decimals, optionally in parentheses.
    pub fn to_wire(&self, parenthesized: bool) -> String {
        let body = format!(
            "{:.6}, {:.6}, {:.6}, {:.6}",
            self.x, self.y, self.heading, self.velocity
        );
        if parenthesized {
            format!("({})", body)
        } else {
            body
        }
    }

    pub fn parse_wire(raw: &str) -> ControlResult<Self> {
        let cleaned = raw.replace(['(', ')'], "");
        let values = cleaned
            .split(',')
            .map(|f| f.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ControlError::malformed(format!("state '{}': {}", raw, e)))?;
        match values.as_slice() {
            [x, y, heading, velocity] => Ok(StateVector {
                x: *x,
                y: *y,
                heading: *heading,
                velocity: *velocity,
            }),
            _ => Err(ControlError::malformed(format!(
                "state '{}' must have 4 components",
                raw
            ))),
        }
    }
}
