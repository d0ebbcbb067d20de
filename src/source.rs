//! Inventory sources.
//!
//! A source is one origin of raw inventory declarations. Knowing which
//! source produced which error is what makes diagnostics actionable, so
//! every source carries a stable identifier.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One origin of raw inventory data.
///
/// Multiple sources combine into one inventory; their order is the layering
/// order, so later sources overlay earlier ones.
///
/// # Examples
///
/// ```
/// use rollcall::Source;
///
/// let static_source = Source::json("lab", r#"{"all": {"hosts": {"h1": null}}}"#).unwrap();
/// let dynamic_source = Source::script("/opt/inventory/netbox.py");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// A static declarative description, already loaded into memory.
    Document {
        /// Identifier used in diagnostics (typically the file path).
        name: String,
        /// The nested group-tree description.
        body: Value,
    },

    /// An executable emitting the dynamic-inventory JSON protocol.
    Script {
        /// Path to the executable.
        path: PathBuf,
    },
}

impl Source {
    /// Creates a static source from an already-parsed document.
    #[must_use]
    pub fn document(name: impl Into<String>, body: Value) -> Self {
        Self::Document {
            name: name.into(),
            body,
        }
    }

    /// Creates a static source from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the underlying decode error if the string is not valid JSON.
    pub fn json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let body: Value = serde_json::from_str(json)?;
        Ok(Self::Document {
            name: name.into(),
            body,
        })
    }

    /// Creates a dynamic source backed by an executable.
    #[must_use]
    pub fn script(path: impl Into<PathBuf>) -> Self {
        Self::Script { path: path.into() }
    }

    /// Returns the identifier used in diagnostics.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Document { name, .. } => name.clone(),
            Self::Script { path } => path.display().to_string(),
        }
    }

    /// Returns the script path for dynamic sources.
    #[must_use]
    pub fn script_path(&self) -> Option<&Path> {
        match self {
            Self::Script { path } => Some(path),
            Self::Document { .. } => None,
        }
    }

    /// Returns true if this is a dynamic (script-backed) source.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Script { .. })
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document { name, .. } => write!(f, "document:{name}"),
            Self::Script { path } => write!(f, "script:{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_constructor_parses_body() {
        let source = Source::json("inline", r#"{"all": {"hosts": {"h1": null}}}"#).unwrap();
        assert_eq!(source.id(), "inline");
        assert!(!source.is_dynamic());

        let Source::Document { body, .. } = &source else {
            panic!("expected document source");
        };
        assert!(body.as_mapping().unwrap().contains_key("all"));
    }

    #[test]
    fn json_constructor_rejects_garbage() {
        assert!(Source::json("inline", "not json {").is_err());
    }

    #[test]
    fn script_source_exposes_path() {
        let source = Source::script("/usr/local/bin/inv.sh");
        assert!(source.is_dynamic());
        assert_eq!(source.id(), "/usr/local/bin/inv.sh");
        assert_eq!(
            source.script_path().unwrap(),
            Path::new("/usr/local/bin/inv.sh")
        );
        assert_eq!(source.to_string(), "script:/usr/local/bin/inv.sh");
    }
}
