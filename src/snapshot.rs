//! Inventory snapshots.
//!
//! A snapshot is the canonical structured triple — hosts, groups, defaults —
//! used for persistence and testing. Serde provides the encoding; this
//! module centralizes the shape and the JSON convenience helpers so
//! formatting stays stable.
//!
//! Restoring trusts declarations only: stored effective variables are
//! discarded and recomputed through aggregation, since a snapshot captures
//! resolved state, not authority over it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::error::InventoryResult;
use crate::group::Group;
use crate::host::{ConnectionInfo, Host};
use crate::inventory::Inventory;
use crate::merge::MergePolicy;
use crate::parser::IntermediateInventory;
use crate::value::Vars;

/// Serialized form of one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Direct group memberships in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    /// Declared host variables.
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,

    /// Opaque connection metadata.
    #[serde(default, skip_serializing_if = "ConnectionInfo::is_empty")]
    pub connection: ConnectionInfo,

    /// Fully resolved variables at snapshot time. Informational: restoring
    /// recomputes them from declarations.
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub effective: Vars,
}

/// Serialized form of one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Parent links in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Declared group variables.
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,
}

/// The canonical persistence triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Host name to host entry.
    #[serde(default)]
    pub hosts: BTreeMap<String, HostEntry>,

    /// Group name to group entry.
    #[serde(default)]
    pub groups: BTreeMap<String, GroupEntry>,

    /// The inventory-wide defaults.
    #[serde(default)]
    pub defaults: Vars,
}

/// Captures a resolved inventory as a snapshot triple.
#[must_use]
pub fn snapshot(inventory: &Inventory) -> InventorySnapshot {
    let hosts = inventory
        .hosts()
        .iter()
        .map(|(name, host)| {
            (
                name.clone(),
                HostEntry {
                    groups: host.groups.clone(),
                    vars: host.vars.clone(),
                    connection: host.connection.clone(),
                    effective: inventory.effective_vars(name).cloned().unwrap_or_default(),
                },
            )
        })
        .collect();

    let groups = inventory
        .groups()
        .iter()
        .map(|(name, group)| {
            (
                name.clone(),
                GroupEntry {
                    parents: group.parents.clone(),
                    vars: group.vars.clone(),
                },
            )
        })
        .collect();

    InventorySnapshot {
        hosts,
        groups,
        defaults: inventory.defaults().clone(),
    }
}

/// Rebuilds an inventory from a snapshot's declarations.
///
/// Effective variables are recomputed under `policy`, never read back from
/// the snapshot.
///
/// # Errors
///
/// A graph error if the snapshot holds dangling references or parent
/// cycles, or the no-valid-inventory error if it declares nothing.
pub fn restore(snapshot: &InventorySnapshot, policy: MergePolicy) -> InventoryResult<Inventory> {
    let mut ir = IntermediateInventory::new();

    for (name, entry) in &snapshot.hosts {
        let mut host = Host::new(name.as_str());
        host.groups = entry.groups.clone();
        host.vars = entry.vars.clone();
        host.connection = entry.connection.clone();
        ir.hosts.insert(name.clone(), host);
    }

    for (name, entry) in &snapshot.groups {
        let mut group = Group::new(name.as_str());
        group.parents = entry.parents.clone();
        group.vars = entry.vars.clone();
        ir.groups.insert(name.clone(), group);
    }

    ir.defaults = snapshot.defaults.clone();
    aggregate(&[ir], policy)
}

/// Serializes a snapshot to pretty JSON.
///
/// # Errors
///
/// Returns the underlying encode error.
pub fn to_json_pretty(snapshot: &InventorySnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

/// Deserializes a snapshot from JSON.
///
/// Callers should then invoke [`restore`] to validate the declarations and
/// obtain a resolved inventory.
///
/// # Errors
///
/// Returns the underlying decode error.
pub fn from_json(s: &str) -> Result<InventorySnapshot, serde_json::Error> {
    serde_json::from_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample_inventory() -> Inventory {
        let ir = crate::parser::parse_json(
            "sample",
            r#"{"all": {
                "vars": {"domain": "lab.example"},
                "children": {
                    "web": {
                        "vars": {"tier": "frontend"},
                        "hosts": {"web1": {"rack": 4, "ansible_host": "192.0.2.10"}}
                    }
                }
            }}"#,
        )
        .unwrap();
        aggregate(&[ir], MergePolicy::Replace).unwrap()
    }

    #[test]
    fn snapshot_carries_declarations_and_effective() {
        let inv = sample_inventory();
        let snap = snapshot(&inv);

        let web1 = &snap.hosts["web1"];
        assert_eq!(web1.groups, vec!["web"]);
        assert_eq!(web1.vars["rack"], Value::Int(4));
        assert_eq!(web1.connection.hostname.as_deref(), Some("192.0.2.10"));
        assert_eq!(web1.effective["domain"], Value::from("lab.example"));
        assert_eq!(web1.effective["tier"], Value::from("frontend"));
        assert_eq!(snap.groups["web"].vars["tier"], Value::from("frontend"));
        assert_eq!(snap.defaults["domain"], Value::from("lab.example"));
    }

    #[test]
    fn restore_reproduces_declarations_and_recomputes_effective() {
        let inv = sample_inventory();
        let restored = restore(&snapshot(&inv), MergePolicy::Replace).unwrap();

        assert_eq!(restored.hosts(), inv.hosts());
        assert_eq!(restored.groups(), inv.groups());
        assert_eq!(restored.defaults(), inv.defaults());
        assert_eq!(restored.effective_vars("web1"), inv.effective_vars("web1"));
    }

    #[test]
    fn restore_ignores_tampered_effective() {
        let inv = sample_inventory();
        let mut snap = snapshot(&inv);
        snap.hosts
            .get_mut("web1")
            .unwrap()
            .effective
            .insert("forged".to_string(), Value::Bool(true));

        let restored = restore(&snap, MergePolicy::Replace).unwrap();
        assert!(!restored.effective_vars("web1").unwrap().contains_key("forged"));
    }

    #[test]
    fn restore_rejects_dangling_group() {
        let mut snap = snapshot(&sample_inventory());
        snap.hosts
            .get_mut("web1")
            .unwrap()
            .groups
            .push("ghost".to_string());

        let err = restore(&snap, MergePolicy::Replace).unwrap_err();
        assert!(err.is_graph());
    }

    #[test]
    fn restore_rejects_empty_snapshot() {
        let err = restore(&InventorySnapshot::default(), MergePolicy::Replace).unwrap_err();
        assert!(err.is_no_valid_inventory());
    }

    #[test]
    fn json_roundtrip_is_stable() {
        let snap = snapshot(&sample_inventory());
        let json = to_json_pretty(&snap).unwrap();
        let decoded = from_json(&json).unwrap();
        assert_eq!(snap, decoded);
    }
}
