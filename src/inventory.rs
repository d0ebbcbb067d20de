//! The resolved inventory.

use std::collections::BTreeMap;

use crate::group::Group;
use crate::host::Host;
use crate::merge::MergePolicy;
use crate::value::Vars;

/// A fully resolved, immutable inventory.
///
/// Built by the aggregator once every source has been parsed, merged, and
/// validated. Effective variables are computed exactly once during
/// resolution; afterwards the inventory only answers queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    hosts: BTreeMap<String, Host>,
    groups: BTreeMap<String, Group>,
    defaults: Vars,
    effective: BTreeMap<String, Vars>,
    policy: MergePolicy,
}

impl Inventory {
    pub(crate) fn new(
        hosts: BTreeMap<String, Host>,
        groups: BTreeMap<String, Group>,
        defaults: Vars,
        effective: BTreeMap<String, Vars>,
        policy: MergePolicy,
    ) -> Self {
        Self {
            hosts,
            groups,
            defaults,
            effective,
            policy,
        }
    }

    /// All hosts, keyed by name.
    #[must_use]
    pub const fn hosts(&self) -> &BTreeMap<String, Host> {
        &self.hosts
    }

    /// All groups, keyed by name.
    #[must_use]
    pub const fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    /// The inventory-wide defaults (lowest precedence).
    #[must_use]
    pub const fn defaults(&self) -> &Vars {
        &self.defaults
    }

    /// The merge policy this inventory was resolved under.
    #[must_use]
    pub const fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Looks up a host by name.
    #[must_use]
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// A host's fully resolved variables: defaults, ancestor groups, and
    /// host overrides folded under this inventory's policy.
    #[must_use]
    pub fn effective_vars(&self, host: &str) -> Option<&Vars> {
        self.effective.get(host)
    }

    /// Number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns true if the inventory holds no hosts.
    ///
    /// A resolved inventory can still own groups and defaults; emptiness of
    /// the whole source set is rejected during aggregation, not here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
