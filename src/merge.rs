//! Variable merging.
//!
//! Layering variables across defaults, groups, hosts, and sources reduces to
//! one pure operation: combine a base mapping with an overlay under a policy.
//! As long as a key keeps the same shape across layers the operation is
//! associative, so a left-to-right fold over N layers is independent of
//! intermediate grouping.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::{Value, Vars};

/// Policy governing how colliding variable keys are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// The overlay's value for a key wins outright, regardless of type.
    #[default]
    Replace,

    /// Deep merge: mappings merge recursively, sequences concatenate,
    /// anything else takes the overlay.
    Merge,
}

impl MergePolicy {
    /// Returns the canonical name of this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Merge => "merge",
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown merge policy '{other}'")),
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combines `overlay` onto `base` under `policy`, returning a new mapping.
///
/// Neither input is mutated. Absence means "key not present": keys missing
/// from the overlay never erase base keys. An explicit `Null` in the overlay
/// is a real value and replaces the base value.
#[must_use]
pub fn combine(base: &Vars, overlay: &Vars, policy: MergePolicy) -> Vars {
    let mut result = base.clone();
    for (key, overlay_value) in overlay {
        let merged = match (policy, result.get(key)) {
            (MergePolicy::Merge, Some(base_value)) => merge_value(base_value, overlay_value),
            _ => overlay_value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    result
}

/// Deep-merges two values.
///
/// Exhaustive over the three shapes that matter: mapping+mapping merges
/// recursively, sequence+sequence concatenates overlay after base, and every
/// other combination (type mismatch or scalar involved) takes the overlay.
#[must_use]
pub fn merge_value(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            Value::Mapping(combine(base_map, overlay_map, MergePolicy::Merge))
        }
        (Value::Sequence(base_seq), Value::Sequence(overlay_seq)) => {
            let mut joined = base_seq.clone();
            joined.extend(overlay_seq.iter().cloned());
            Value::Sequence(joined)
        }
        (_, other) => other.clone(),
    }
}
