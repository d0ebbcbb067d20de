//! # Rollcall - Deterministic Host Inventory Resolution
//!
//! Rollcall ingests host/group topology descriptions from one or more
//! layered sources — static declarative documents, or dynamic scripts that
//! emit equivalent structured JSON — and produces a single, merged,
//! queryable inventory of hosts, groups, and variable defaults.
//!
//! ## Core Concepts
//!
//! - **Host**: an identity with group memberships, variables, and opaque
//!   connection metadata
//! - **Group**: a variable scope with multi-parent inheritance
//! - **Defaults**: the inventory-wide lowest-precedence variable layer
//! - **Source**: one origin of raw declarations; sources layer left-to-right
//! - **Effective variables**: the precedence-resolved mapping per host —
//!   defaults, then ancestor groups nearest-last, then host overrides
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rollcall::{MergePolicy, Resolver, Source};
//!
//! let resolver = Resolver::new().with_policy(MergePolicy::Merge);
//!
//! let inventory = resolver.resolve(&[
//!     Source::json("static", std::fs::read_to_string("hosts.json")?.as_str())?,
//!     Source::script("/opt/inventory/netbox.py"),
//! ])?;
//!
//! for (name, host) in inventory.hosts() {
//!     let vars = inventory.effective_vars(name).unwrap();
//!     println!("{name}: {} groups, {} vars", host.groups.len(), vars.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core data model
pub mod error;
pub mod group;
pub mod host;
pub mod merge;
pub mod source;
pub mod value;

// Resolution pipeline
pub mod aggregate;
pub mod graph;
pub mod inventory;
pub mod parser;
pub mod snapshot;

// Re-export primary types at crate root for convenience
pub use aggregate::{aggregate, Resolver};
pub use error::{GraphError, InventoryError, InventoryResult, StructuralError};
pub use graph::GroupGraph;
pub use group::Group;
pub use host::{ConnectionInfo, Host};
pub use inventory::Inventory;
pub use merge::{combine, merge_value, MergePolicy};
pub use parser::{
    parse_document, parse_json, parse_script_output, CommandFetcher, DynamicFetch,
    IntermediateInventory,
};
pub use snapshot::{from_json, restore, snapshot, to_json_pretty, InventorySnapshot};
pub use source::Source;
pub use value::{vars_from_json, Value, Vars};
