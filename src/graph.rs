//! Group graph resolution.
//!
//! Groups form a directed acyclic graph through multi-parent links, with
//! shared ancestors allowed. The graph is walked iteratively — breadth-first
//! for ancestry, an explicit-stack depth-first pass for cycle detection — so
//! cycle handling is a first-class validation step rather than a stack
//! overflow waiting to happen.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::error::GraphError;
use crate::group::Group;
use crate::host::Host;
use crate::merge::{combine, MergePolicy};
use crate::value::Vars;

/// Node state for the iterative cycle-detection walk.
const UNSEEN: u8 = 0;
const IN_STACK: u8 = 1;
const DONE: u8 = 2;

/// A view over the group parent graph of an inventory.
///
/// Borrows the group set; resolution never mutates it.
#[derive(Debug, Clone, Copy)]
pub struct GroupGraph<'a> {
    groups: &'a BTreeMap<String, Group>,
}

impl<'a> GroupGraph<'a> {
    /// Creates a graph view over a group set.
    #[must_use]
    pub const fn new(groups: &'a BTreeMap<String, Group>) -> Self {
        Self { groups }
    }

    fn parents_of(&self, group: &str) -> &'a [String] {
        self.groups
            .get(group)
            .map(|g| g.parents.as_slice())
            .unwrap_or_default()
    }

    /// Validates the merged graph: every membership and parent link must
    /// resolve to a defined group, and parent links must be acyclic.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] naming the offending host, group, or parent.
    pub fn validate<'h>(
        &self,
        hosts: impl IntoIterator<Item = &'h Host>,
    ) -> Result<(), GraphError> {
        for host in hosts {
            for group in &host.groups {
                if !self.groups.contains_key(group) {
                    return Err(GraphError::UnknownHostGroup {
                        host: host.name.clone(),
                        group: group.clone(),
                    });
                }
            }
        }
        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut state: HashMap<&str, u8> = HashMap::with_capacity(self.groups.len());

        for root in self.groups.keys() {
            if state.get(root.as_str()).copied().unwrap_or(UNSEEN) != UNSEEN {
                continue;
            }

            // Explicit stack of (group, next-parent-index) frames.
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            state.insert(root.as_str(), IN_STACK);

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let idx = frame.1;
                frame.1 += 1;

                let Some(parent) = self.parents_of(node).get(idx) else {
                    state.insert(node, DONE);
                    stack.pop();
                    continue;
                };

                if !self.groups.contains_key(parent) {
                    return Err(GraphError::UnknownParent {
                        group: node.to_string(),
                        parent: parent.clone(),
                    });
                }
                match state.get(parent.as_str()).copied().unwrap_or(UNSEEN) {
                    IN_STACK => {
                        return Err(GraphError::ParentCycle {
                            group: parent.clone(),
                        });
                    }
                    DONE => {}
                    _ => {
                        state.insert(parent.as_str(), IN_STACK);
                        stack.push((parent.as_str(), 0));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the full ancestor chain for a set of direct memberships,
    /// closest-first: the direct groups in declared order, then parents,
    /// then grandparents. Ties at one depth keep first-discovery order.
    ///
    /// Shared ancestors appear once, at the depth where the breadth-first
    /// walk first reaches them. Unknown names are skipped; [`Self::validate`]
    /// is the place that rejects them.
    #[must_use]
    pub fn ancestry(&self, direct: &[String]) -> Vec<String> {
        self.layered_ancestry(direct)
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Breadth-first discovery order with the depth each group was first
    /// reached at. Depth 0 is a direct membership.
    fn layered_ancestry(&self, direct: &[String]) -> Vec<(String, usize)> {
        let mut discovered: Vec<(String, usize)> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

        for group in direct {
            if self.groups.contains_key(group) && visited.insert(group.as_str()) {
                queue.push_back((group.as_str(), 0));
            }
        }

        while let Some((group, depth)) = queue.pop_front() {
            discovered.push((group.to_string(), depth));
            for parent in self.parents_of(group) {
                if self.groups.contains_key(parent) && visited.insert(parent.as_str()) {
                    queue.push_back((parent.as_str(), depth + 1));
                }
            }
        }

        discovered
    }

    /// Computes a host's effective variables.
    ///
    /// Folds the variable merger from lowest to highest precedence:
    /// `defaults`, then ancestor groups farthest depth first, then the
    /// host's own variables last. Within one depth, groups apply in
    /// discovery order, so the later of two same-depth parents wins a
    /// conflicting key; nearer depths always override farther depths.
    #[must_use]
    pub fn effective_vars(&self, host: &Host, defaults: &Vars, policy: MergePolicy) -> Vars {
        let mut chain = self.layered_ancestry(&host.groups);
        // Stable by construction: within a depth, discovery order survives.
        chain.sort_by(|(_, a), (_, b)| b.cmp(a));

        let mut effective = defaults.clone();
        for (name, _) in &chain {
            if let Some(group) = self.groups.get(name) {
                effective = combine(&effective, &group.vars, policy);
            }
        }
        combine(&effective, &host.vars, policy)
    }
}
