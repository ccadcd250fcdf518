use serde_json::Value;
use std::collections::BTreeMap;

use super::sample::{Pose, TrackedSample};
use crate::common::{ControlError, ControlResult};
use crate::domains::geometry::{region_from_sample, Covering, Hyperrectangle, RegionKind};

/// One localization snapshot: object name to raw sample, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: BTreeMap<String, TrackedSample>,
}

#[derive(Debug, Clone)]
pub struct NamedRegion {
    pub name: String,
    pub region: Hyperrectangle,
}

/// Regions of one kind, plus the objects that were dropped for this cycle.
#[derive(Debug, Default)]
pub struct RegionSet {
    pub regions: Vec<NamedRegion>,
    pub rejected: Vec<(String, ControlError)>,
}

impl RegionSet {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn stacked(&self) -> String {
        crate::domains::geometry::stack_regions(self.regions.iter().map(|r| &r.region))
    }
}

impl Scene {
    pub fn from_json(value: &Value) -> ControlResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| ControlError::violation("localization snapshot is not a JSON object"))?;
        let objects = map
            .iter()
            .map(|(name, raw)| {
                let sample = match raw.as_str() {
                    Some(s) => TrackedSample::parse(s),
                    None => TrackedSample::Fields(vec![raw.to_string()]),
                };
                (name.clone(), sample)
            })
            .collect();
        Ok(Self { objects })
    }

    pub fn insert(&mut self, name: impl Into<String>, raw: &str) {
        self.objects.insert(name.into(), TrackedSample::parse(raw));
    }

    pub fn get(&self, name: &str) -> Option<&TrackedSample> {
        self.objects.get(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Names that are absent or untracked.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.get(name).map(TrackedSample::is_tracked).unwrap_or(false))
            .collect()
    }

    pub fn robot_pose(&self, robot: &str) -> ControlResult<Pose> {
        match self.get(robot) {
            None => Err(ControlError::malformed(format!("robot '{}' not in snapshot", robot))),
            Some(TrackedSample::Untracked) => {
                Err(ControlError::malformed(format!("robot '{}' is untracked", robot)))
            }
            Some(sample) => sample.pose(),
        }
    }

    /// Every tracked object whose name carries the kind's marker, turned into a region.
    pub fn regions(&self, kind: RegionKind, covering: Covering) -> RegionSet {
        let mut set = RegionSet::default();
        for (name, sample) in &self.objects {
            if !name.contains(kind.name_marker()) || !sample.is_tracked() {
                continue;
            }
            match region_from_sample(sample, kind, covering) {
                Ok(region) => set.regions.push(NamedRegion {
                    name: name.clone(),
                    region,
                }),
                Err(e) => set.rejected.push((name.clone(), e)),
            }
        }
        set
    }
}
