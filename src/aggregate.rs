//! Cross-source aggregation.
//!
//! Sources combine strictly left-to-right: variables overlay under the
//! configured merge policy, while group memberships and parent links are
//! unioned, never overwritten. Precedence depends on source order, so the
//! fold is sequential by contract.

use std::collections::BTreeMap;

use crate::error::{InventoryError, InventoryResult};
use crate::graph::GroupGraph;
use crate::group::Group;
use crate::host::Host;
use crate::inventory::Inventory;
use crate::merge::{combine, MergePolicy};
use crate::parser::{
    parse_document, parse_script_output, CommandFetcher, DynamicFetch, IntermediateInventory,
};
use crate::source::Source;
use crate::value::Vars;

/// Combines parsed sources into one resolved inventory.
///
/// Later sources overlay earlier ones. After the raw fold, the merged group
/// graph is validated (dangling references, cycles) and every host's
/// effective variables are computed once. A single source is the degenerate
/// fold.
///
/// # Errors
///
/// Returns a graph error for an invalid merged graph, and the
/// no-valid-inventory error when the fold produces zero hosts and zero
/// groups.
pub fn aggregate(
    sources: &[IntermediateInventory],
    policy: MergePolicy,
) -> InventoryResult<Inventory> {
    let mut hosts: BTreeMap<String, Host> = BTreeMap::new();
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    let mut defaults = Vars::new();

    for source in sources {
        for host in source.hosts.values() {
            match hosts.get_mut(&host.name) {
                None => {
                    hosts.insert(host.name.clone(), host.clone());
                }
                Some(existing) => {
                    existing.vars = combine(&existing.vars, &host.vars, policy);
                    for group in &host.groups {
                        existing.push_group(group.clone());
                    }
                    existing.connection = existing.connection.overlaid(&host.connection);
                }
            }
        }

        for group in source.groups.values() {
            match groups.get_mut(&group.name) {
                None => {
                    groups.insert(group.name.clone(), group.clone());
                }
                Some(existing) => {
                    existing.vars = combine(&existing.vars, &group.vars, policy);
                    for parent in &group.parents {
                        existing.push_parent(parent.clone());
                    }
                }
            }
        }

        defaults = combine(&defaults, &source.defaults, policy);
    }

    if hosts.is_empty() && groups.is_empty() {
        return Err(InventoryError::no_valid_inventory(Vec::new()));
    }

    let graph = GroupGraph::new(&groups);
    graph.validate(hosts.values())?;

    let effective: BTreeMap<String, Vars> = hosts
        .values()
        .map(|host| {
            (
                host.name.clone(),
                graph.effective_vars(host, &defaults, policy),
            )
        })
        .collect();

    Ok(Inventory::new(hosts, groups, defaults, effective, policy))
}

/// Top-level entry: parses sources and aggregates them.
///
/// Holds the merge policy and the dynamic fetcher; the default fetcher runs
/// scripts with [`CommandFetcher`].
///
/// # Examples
///
/// ```rust,ignore
/// use rollcall::{MergePolicy, Resolver, Source};
///
/// let resolver = Resolver::new().with_policy(MergePolicy::Merge);
/// let inventory = resolver.resolve(&[
///     Source::json("base", base_json)?,
///     Source::script("/opt/inventory/netbox.py"),
/// ])?;
/// ```
pub struct Resolver {
    policy: MergePolicy,
    fetcher: Box<dyn DynamicFetch>,
}

impl Resolver {
    /// Creates a resolver with the default policy (`replace`) and the
    /// subprocess fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: MergePolicy::default(),
            fetcher: Box::new(CommandFetcher::new()),
        }
    }

    /// Sets the merge policy used throughout aggregation.
    #[must_use]
    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the dynamic fetcher. Tests use this to resolve script
    /// sources without executing anything.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: impl DynamicFetch + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Parses every source in order and aggregates the results.
    ///
    /// A parse failure in any source aborts the whole resolution; precedence
    /// is only meaningful with every layer present.
    ///
    /// # Errors
    ///
    /// Structural errors from parsing, graph errors from validation, or the
    /// no-valid-inventory error when the source set resolves to nothing.
    pub fn resolve(&self, sources: &[Source]) -> InventoryResult<Inventory> {
        if sources.is_empty() {
            return Err(InventoryError::no_valid_inventory(Vec::new()));
        }

        let mut parsed = Vec::with_capacity(sources.len());
        for source in sources {
            let ir = match source {
                Source::Document { name, body } => parse_document(name, body)?,
                Source::Script { path } => {
                    let raw = self.fetcher.fetch(path)?;
                    parse_script_output(&path.display().to_string(), &raw)?
                }
            };
            parsed.push(ir);
        }

        aggregate(&parsed, self.policy).map_err(|err| match err {
            InventoryError::NoValidInventory { .. } => InventoryError::no_valid_inventory(
                sources.iter().map(Source::id).collect(),
            ),
            other => other,
        })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
