//! Source parsing.
//!
//! Both source variants — static declarative documents and dynamic script
//! output — normalize to one nested group-tree shape and share a single
//! walk that produces the intermediate representation consumed by the
//! aggregator.
//!
//! The tree shape: a root group named `all` whose `vars` become the
//! inventory defaults, whose `hosts` belong to no group, and whose
//! `children` are the top-level groups. Any nested `children` entry links
//! the child group to its enclosing group as a parent.

mod document;
mod script;

pub use document::{parse_document, parse_json};
pub use script::{parse_script_output, CommandFetcher, DynamicFetch};

use std::collections::BTreeMap;

use crate::error::{InventoryResult, StructuralError};
use crate::group::Group;
use crate::host::Host;
use crate::value::{Value, Vars};

/// Name of the implicit root group.
pub(crate) const ROOT_GROUP: &str = "all";

/// Legacy variable aliases mapped onto native connection keys.
const CONNECTION_ALIASES: [(&str, &str); 4] = [
    ("ansible_host", "hostname"),
    ("ansible_port", "port"),
    ("ansible_user", "username"),
    ("ansible_password", "password"),
];

/// Normalized declarations from a single source, prior to cross-source
/// aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateInventory {
    /// Hosts declared by this source.
    pub hosts: BTreeMap<String, Host>,

    /// Groups declared by this source.
    pub groups: BTreeMap<String, Group>,

    /// Defaults declared by this source.
    pub defaults: Vars,
}

impl IntermediateInventory {
    /// Creates an empty intermediate representation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this source declared no hosts and no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.groups.is_empty()
    }
}

fn invalid_shape(source: &str, reason: impl Into<String>) -> StructuralError {
    StructuralError::InvalidShape {
        source: source.to_string(),
        reason: reason.into(),
    }
}

fn expect_mapping<'v>(source: &str, context: &str, value: &'v Value) -> InventoryResult<&'v Vars> {
    value.as_mapping().ok_or_else(|| {
        invalid_shape(
            source,
            format!("{context} must be a mapping, got {}", value.type_name()),
        )
    })
    .map_err(Into::into)
}

/// Walks a normalized document into an intermediate representation.
///
/// The document root must be a mapping holding the `all` group.
pub(crate) fn parse_tree(source: &str, document: &Value) -> InventoryResult<IntermediateInventory> {
    let root = expect_mapping(source, "document root", document)?;
    let Some(all_body) = root.get(ROOT_GROUP) else {
        return Err(StructuralError::MissingIdentifier {
            source: source.to_string(),
            identifier: ROOT_GROUP.to_string(),
        }
        .into());
    };
    if root.len() > 1 {
        tracing::warn!(source, "ignoring top-level keys other than the root group");
    }

    let mut ir = IntermediateInventory::new();
    walk_group(source, &mut ir, ROOT_GROUP, all_body, None)?;
    Ok(ir)
}

fn group_body<'v>(source: &str, name: &str, body: &'v Value) -> InventoryResult<Option<&'v Vars>> {
    match body {
        Value::Null => Ok(None),
        Value::Mapping(m) => Ok(Some(m)),
        other => Err(invalid_shape(
            source,
            format!(
                "group '{name}' body must be a mapping or null, got {}",
                other.type_name()
            ),
        )
        .into()),
    }
}

fn walk_group(
    source: &str,
    ir: &mut IntermediateInventory,
    name: &str,
    body: &Value,
    parent: Option<&str>,
) -> InventoryResult<()> {
    let Some(body) = group_body(source, name, body)? else {
        if name != ROOT_GROUP {
            register_group(ir, name, parent);
        }
        return Ok(());
    };

    let vars = match body.get("vars") {
        None => None,
        Some(v) => Some(expect_mapping(source, &format!("group '{name}' vars"), v)?.clone()),
    };

    if name == ROOT_GROUP {
        if let Some(vars) = vars {
            ir.defaults.extend(vars);
        }
    } else {
        let group = register_group(ir, name, parent);
        if let Some(vars) = vars {
            group.vars.extend(vars);
        }
    }

    if let Some(hosts) = body.get("hosts") {
        let member_of = (name != ROOT_GROUP).then_some(name);
        walk_hosts(source, ir, hosts, member_of)?;
    }

    if let Some(children) = body.get("children") {
        let children = expect_mapping(source, &format!("group '{name}' children"), children)?;
        let parent_of_children = (name != ROOT_GROUP).then_some(name);
        for (child, child_body) in children {
            walk_group(source, ir, child, child_body, parent_of_children)?;
        }
    }

    Ok(())
}

fn register_group<'g>(
    ir: &'g mut IntermediateInventory,
    name: &str,
    parent: Option<&str>,
) -> &'g mut Group {
    let group = ir
        .groups
        .entry(name.to_string())
        .or_insert_with(|| Group::new(name));
    if let Some(parent) = parent {
        group.push_parent(parent);
    }
    group
}

fn walk_hosts(
    source: &str,
    ir: &mut IntermediateInventory,
    hosts: &Value,
    member_of: Option<&str>,
) -> InventoryResult<()> {
    let hosts = expect_mapping(source, "hosts", hosts)?;
    for (host_name, host_body) in hosts {
        let vars = match host_body {
            Value::Null => Vars::new(),
            Value::Mapping(m) => m.clone(),
            other => {
                return Err(invalid_shape(
                    source,
                    format!(
                        "host '{host_name}' body must be a mapping or null, got {}",
                        other.type_name()
                    ),
                )
                .into())
            }
        };

        let host = ir
            .hosts
            .entry(host_name.clone())
            .or_insert_with(|| Host::new(host_name.as_str()));
        if let Some(group) = member_of {
            host.push_group(group);
        }
        host.vars.extend(vars);
        extract_connection(source, host)?;
    }
    Ok(())
}

/// Moves reserved connection keys out of a host's variables.
///
/// Legacy aliases are renamed to their native keys first, so a native key
/// appearing after an alias wins.
fn extract_connection(source: &str, host: &mut Host) -> InventoryResult<()> {
    for (alias, native) in CONNECTION_ALIASES {
        if let Some(value) = host.vars.remove(alias) {
            host.vars.insert(native.to_string(), value);
        }
    }

    if let Some(value) = host.vars.remove("port") {
        let port = value
            .as_int()
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| {
                invalid_shape(
                    source,
                    format!("host '{}': 'port' must be an integer in 0-65535", host.name),
                )
            })?;
        host.connection.port = Some(port);
    }

    for (key, slot) in [
        ("hostname", &mut host.connection.hostname),
        ("username", &mut host.connection.username),
        ("password", &mut host.connection.password),
        ("platform", &mut host.connection.platform),
    ] {
        if let Some(value) = host.vars.remove(key) {
            let Value::String(s) = value else {
                return Err(invalid_shape(
                    source,
                    format!("host '{}': '{key}' must be a string", host.name),
                )
                .into());
            };
            *slot = Some(s);
        }
    }
    Ok(())
}
