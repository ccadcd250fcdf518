use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{ControlError, ControlResult};
use crate::domains::localization::TrackedSample;

/// Decimals used for bounds computed from a sample.
pub const COMPUTED_PRECISION: usize = 4;
/// Decimals used for the hardcoded heading/velocity sub-ranges.
pub const FIXED_PRECISION: usize = 1;

pub const HEADING_RANGE: (f64, f64) = (-3.2, 3.2);
pub const TARGET_VELOCITY_RANGE: (f64, f64) = (0.0, 0.8);
pub const OBSTACLE_VELOCITY_RANGE: (f64, f64) = (-2.1, 2.1);
/// Position of the fixed auxiliary covering box.
pub const AUXILIARY_POSITION_RANGE: (f64, f64) = (2.0, 3.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Target,
    Obstacle,
}

impl RegionKind {
    /// Substring that marks a localization object as belonging to this kind.
    pub fn name_marker(&self) -> &'static str {
        match self {
            RegionKind::Target => "Target",
            RegionKind::Obstacle => "Obstacle",
        }
    }

    pub fn velocity_range(&self) -> Interval {
        let (lo, hi) = match self {
            RegionKind::Target => TARGET_VELOCITY_RANGE,
            RegionKind::Obstacle => OBSTACLE_VELOCITY_RANGE,
        };
        Interval::fixed(lo, hi)
    }

    pub fn heading_range(&self) -> Interval {
        Interval::fixed(HEADING_RANGE.0, HEADING_RANGE.1)
    }
}

/// How many alternative boxes one logical object is expressed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Covering {
    #[default]
    Single,
    /// The computed box twice.
    Mirror,
    /// The computed box followed by the fixed auxiliary box.
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
    #[serde(skip, default = "default_precision")]
    precision: usize,
}

fn default_precision() -> usize {
    COMPUTED_PRECISION
}

impl Interval {
    pub fn computed(lo: f64, hi: f64) -> Self {
        Self { lo, hi, precision: COMPUTED_PRECISION }
    }

    pub fn fixed(lo: f64, hi: f64) -> Self {
        Self { lo, hi, precision: FIXED_PRECISION }
    }

    /// Interval centred on `centre` spanning `extent`.
    pub fn around(centre: f64, extent: f64) -> Self {
        let half = extent / 2.0;
        let (a, b) = (centre - half, centre + half);
        Self::computed(a.min(b), a.max(b))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{:.*},{:.*}}}", self.precision, self.lo, self.precision, self.hi)
    }
}

/// One axis-aligned box in (x, y, heading, velocity) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperBox {
    pub x: Interval,
    pub y: Interval,
    pub heading: Interval,
    pub velocity: Interval,
}

impl HyperBox {
    pub fn contains_position(&self, x: f64, y: f64) -> bool {
        self.x.contains(x) && self.y.contains(y)
    }

    fn auxiliary(kind: RegionKind) -> Self {
        let (lo, hi) = AUXILIARY_POSITION_RANGE;
        Self {
            x: Interval::fixed(lo, hi),
            y: Interval::fixed(lo, hi),
            heading: kind.heading_range(),
            velocity: kind.velocity_range(),
        }
    }
}

impl fmt::Display for HyperBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.heading, self.velocity)
    }
}

/// Disjunction of boxes covering one logical object, joined by `|` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperrectangle {
    blocks: Vec<HyperBox>,
}

impl Hyperrectangle {
    pub fn new(blocks: Vec<HyperBox>) -> ControlResult<Self> {
        if blocks.is_empty() {
            return Err(ControlError::malformed("hyperrectangle needs at least one box"));
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[HyperBox] {
        &self.blocks
    }

    pub fn primary(&self) -> &HyperBox {
        &self.blocks[0]
    }

    /// Target-reached test: inside the first box on both position axes.
    pub fn contains_position(&self, x: f64, y: f64) -> bool {
        self.primary().contains_position(x, y)
    }
}

impl fmt::Display for Hyperrectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl FromStr for Hyperrectangle {
    type Err = ControlError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let blocks = raw
            .split('|')
            .map(parse_block)
            .collect::<ControlResult<Vec<_>>>()?;
        Hyperrectangle::new(blocks)
    }
}

fn parse_block(raw: &str) -> ControlResult<HyperBox> {
    let values = raw
        .replace(['{', '}'], "")
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ControlError::malformed(format!("hyperrectangle '{}': {}", raw, e)))?;
    if values.len() != 8 {
        return Err(ControlError::malformed(format!(
            "hyperrectangle block '{}' needs 4 interval pairs",
            raw
        )));
    }
    let pair = |i: usize| Interval::computed(values[i], values[i + 1]);
    Ok(HyperBox {
        x: pair(0),
        y: pair(2),
        heading: pair(4),
        velocity: pair(6),
    })
}

/// Builds the wire region for one tracked object.
pub fn region_from_sample(
    sample: &TrackedSample,
    kind: RegionKind,
    covering: Covering,
) -> ControlResult<Hyperrectangle> {
    let footprint = sample.footprint()?;
    let computed = HyperBox {
        x: Interval::around(footprint.x, footprint.width),
        y: Interval::around(footprint.y, footprint.height),
        heading: kind.heading_range(),
        velocity: kind.velocity_range(),
    };
    let blocks = match covering {
        Covering::Single => vec![computed],
        Covering::Mirror => vec![computed, computed],
        Covering::Auxiliary => vec![computed, HyperBox::auxiliary(kind)],
    };
    Hyperrectangle::new(blocks)
}

/// Joins several regions into one disjunctive wire string. Empty input yields an empty string.
pub fn stack_regions<'a, I>(regions: I) -> String
where
    I: IntoIterator<Item = &'a Hyperrectangle>,
{
    regions
        .into_iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("|")
}
