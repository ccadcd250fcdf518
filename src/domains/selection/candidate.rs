use serde::{Deserialize, Serialize};

use crate::domains::localization::StateVector;

/// Fields in a plain `steering,throttle` entry.
pub const PLAIN_ENTRY_FIELDS: usize = 2;
/// Fields in an anchored `x,y,heading,velocity,steering,throttle` entry.
pub const ANCHORED_ENTRY_FIELDS: usize = 6;
/// Fields in an anchored `x,y,heading,velocity,control` entry naming a symbolic input.
pub const SYMBOLIC_ENTRY_FIELDS: usize = 5;

/// One admissible control from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionCandidate {
    pub steering: f64,
    pub throttle: f64,
    /// State the service attached to this control, if the menu carries one.
    pub anchor: Option<StateVector>,
    /// Index of a symbolic control input, for entries that carry one instead of steering and throttle.
    pub control: Option<f64>,
}

impl ActionCandidate {
    pub fn new(steering: f64, throttle: f64) -> Self {
        Self {
            steering,
            throttle,
            anchor: None,
            control: None,
        }
    }

    pub fn symbolic(control: f64, anchor: StateVector) -> Self {
        Self {
            steering: 0.0,
            throttle: 0.0,
            anchor: Some(anchor),
            control: Some(control),
        }
    }

    /// Two candidates issue the same control input when steering and throttle agree.
    pub fn same_control(&self, other: &ActionCandidate) -> bool {
        match (self.control, other.control) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.steering == other.steering && self.throttle == other.throttle,
            _ => false,
        }
    }

    /// Strict sign agreement on throttle. Zero never matches.
    pub fn same_direction(&self, other: &ActionCandidate) -> bool {
        (self.throttle > 0.0 && other.throttle > 0.0) || (self.throttle < 0.0 && other.throttle < 0.0)
    }
}

/// Why one menu entry was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryRejection {
    Empty,
    FieldCount { expected: usize, actual: usize },
    NotNumeric(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMenu {
    pub candidates: Vec<ActionCandidate>,
    pub rejected: Vec<(usize, String, EntryRejection)>,
    pub entries: usize,
}

/// Splits the raw menu on `|` and parses each `(a,b)` or bare `a,b` entry.
/// `expected_fields` is 2 for plain entries or 6 for anchored ones; anchored menus
/// also take 5-field entries ending in a symbolic control index.
pub fn parse_menu(raw: &str, expected_fields: usize) -> ParsedMenu {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mut menu = ParsedMenu {
        candidates: Vec::new(),
        rejected: Vec::new(),
        entries: 0,
    };
    for (idx, entry) in compact.split('|').enumerate() {
        menu.entries += 1;
        match parse_entry(entry, expected_fields) {
            Ok(candidate) => menu.candidates.push(candidate),
            Err(rejection) => menu.rejected.push((idx, entry.to_string(), rejection)),
        }
    }
    menu
}

fn parse_entry(entry: &str, expected_fields: usize) -> Result<ActionCandidate, EntryRejection> {
    let cleaned = entry.replace(['(', ')'], "");
    if cleaned.is_empty() {
        return Err(EntryRejection::Empty);
    }
    let fields: Vec<&str> = cleaned.split(',').collect();
    let symbolic = expected_fields == ANCHORED_ENTRY_FIELDS && fields.len() == SYMBOLIC_ENTRY_FIELDS;
    if fields.len() != expected_fields && !symbolic {
        return Err(EntryRejection::FieldCount {
            expected: expected_fields,
            actual: fields.len(),
        });
    }
    let values = fields
        .iter()
        .map(|f| match f.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(EntryRejection::NotNumeric(f.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match values.as_slice() {
        [steering, throttle] => ActionCandidate::new(*steering, *throttle),
        [x, y, heading, velocity, control] => ActionCandidate::symbolic(
            *control,
            StateVector {
                x: *x,
                y: *y,
                heading: *heading,
                velocity: *velocity,
            },
        ),
        [x, y, heading, velocity, steering, throttle] => ActionCandidate {
            steering: *steering,
            throttle: *throttle,
            anchor: Some(StateVector {
                x: *x,
                y: *y,
                heading: *heading,
                velocity: *velocity,
            }),
            control: None,
        },
        _ => {
            return Err(EntryRejection::FieldCount {
                expected: expected_fields,
                actual: values.len(),
            })
        }
    })
}
