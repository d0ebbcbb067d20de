//! Static declarative sources.
//!
//! A static source is a structured description already loaded into memory:
//! a root `all` group with `vars`, `hosts`, and nested `children`. Reading
//! bytes off disk and choosing a text format are the caller's concern; this
//! module only validates and normalizes the shape.

use crate::error::{InventoryError, InventoryResult, StructuralError};
use crate::parser::{parse_tree, IntermediateInventory};
use crate::value::Value;

/// Parses a static declarative document into an intermediate
/// representation.
///
/// # Errors
///
/// Returns a structural error for malformed shapes, and the
/// no-valid-inventory error if the document declares zero hosts and zero
/// groups.
pub fn parse_document(source: &str, document: &Value) -> InventoryResult<IntermediateInventory> {
    let ir = parse_tree(source, document)?;
    if ir.is_empty() {
        return Err(InventoryError::no_valid_inventory(vec![source.to_string()]));
    }
    tracing::debug!(
        source,
        hosts = ir.hosts.len(),
        groups = ir.groups.len(),
        "parsed static inventory source"
    );
    Ok(ir)
}

/// Parses a static declarative document from a JSON string.
///
/// # Errors
///
/// Same as [`parse_document`], plus a structural error when the string is
/// not valid JSON.
pub fn parse_json(source: &str, json: &str) -> InventoryResult<IntermediateInventory> {
    let document: Value = serde_json::from_str(json).map_err(|e| StructuralError::InvalidShape {
        source: source.to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;
    parse_document(source, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn parses_full_document() {
        let ir = parse_json(
            "lab.json",
            r#"{"all": {
                "vars": {"domain": "lab.example"},
                "children": {
                    "web": {
                        "vars": {"tier": "frontend"},
                        "hosts": {"web1": {"rack": 4}, "web2": null}
                    },
                    "edge": {"children": {"web": null}}
                }
            }}"#,
        )
        .unwrap();

        assert_eq!(ir.defaults["domain"], Value::from("lab.example"));
        assert_eq!(ir.groups["web"].vars["tier"], Value::from("frontend"));
        assert_eq!(ir.groups["web"].parents, vec!["edge"]);
        assert_eq!(ir.hosts["web1"].vars["rack"], Value::Int(4));
        assert!(ir.hosts["web2"].vars.is_empty());
    }

    #[test]
    fn empty_document_is_no_valid_inventory() {
        let err = parse_json("empty.json", r#"{"all": {"vars": {"k": 1}}}"#).unwrap_err();
        assert!(err.is_no_valid_inventory());
        assert!(format!("{err}").contains("empty.json"));
    }

    #[test]
    fn invalid_json_is_structural() {
        let err = parse_json("bad.json", "{oops").unwrap_err();
        assert!(err.is_structural());
        assert!(format!("{err}").contains("bad.json"));
    }

    #[test]
    fn group_with_no_hosts_is_still_valid() {
        let ir = parse_json("g.json", r#"{"all": {"children": {"spare": null}}}"#).unwrap();
        assert!(ir.hosts.is_empty());
        assert!(ir.groups.contains_key("spare"));
    }
}
