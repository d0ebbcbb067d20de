//! Error types for inventory resolution.
//!
//! All errors are strongly typed using thiserror. Every variant carries the
//! identifier of the offending source, host, or group so callers can report
//! actionable diagnostics without re-parsing anything.

use std::fmt;

use thiserror::Error;

/// Structural errors rooted in malformed or self-contradictory source data.
///
/// These cover both static documents with an unexpected shape and dynamic
/// scripts that fail to produce well-formed output. They are never retried
/// by the resolver.
//
// NOTE: `Display`/`Error` are implemented by hand rather than via
// `#[derive(Error)]` because every variant carries a `String` field named
// `source` (the source *identifier*). thiserror reserves that field name for
// an underlying `std::error::Error` source, which a `String` is not, so the
// derive does not compile. The hand-written `Display` below reproduces the
// exact messages the `#[error(...)]` attributes specified.
#[derive(Debug)]
pub enum StructuralError {
    InvalidShape {
        source: String,
        reason: String,
    },

    MissingIdentifier {
        source: String,
        identifier: String,
    },

    ScriptLaunch {
        source: String,
        reason: String,
    },

    ScriptExit {
        source: String,
        code: Option<i32>,
        stderr: String,
    },

    ScriptTimeout {
        source: String,
        timeout_ms: u64,
    },

    MalformedJson {
        source: String,
        reason: String,
    },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShape { source, reason } => {
                write!(f, "source '{source}': invalid shape: {reason}")
            }
            Self::MissingIdentifier { source, identifier } => {
                write!(f, "source '{source}': missing required identifier '{identifier}'")
            }
            Self::ScriptLaunch { source, reason } => {
                write!(f, "script '{source}' could not be launched: {reason}")
            }
            Self::ScriptExit {
                source,
                code,
                stderr,
            } => write!(
                f,
                "script '{source}' exited with non-zero status{}: {stderr}",
                code.map(|c| format!(" {c}")).unwrap_or_default()
            ),
            Self::ScriptTimeout { source, timeout_ms } => {
                write!(f, "script '{source}' timed out after {timeout_ms}ms")
            }
            Self::MalformedJson { source, reason } => {
                write!(f, "script '{source}' emitted malformed JSON: {reason}")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Graph errors detected after all sources are merged.
///
/// Raised when group parent links form a cycle or when a host or group
/// references a group that no source ever defined.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("group parent links form a cycle through '{group}'")]
    ParentCycle {
        group: String,
    },

    #[error("host '{host}' references undefined group '{group}'")]
    UnknownHostGroup {
        host: String,
        group: String,
    },

    #[error("group '{group}' references undefined parent '{parent}'")]
    UnknownParent {
        group: String,
        parent: String,
    },
}

/// Top-level error type for inventory resolution.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// No source yielded any hosts or groups.
    ///
    /// This is the one kind callers are expected to catch and handle
    /// distinctly: an inventory that resolves to nothing is invalid input,
    /// not a vacuously valid result.
    #[error("no valid inventory from source(s): {}", .sources.join(", "))]
    NoValidInventory {
        sources: Vec<String>,
    },
}

impl InventoryError {
    /// Creates a no-valid-inventory error for the given source identifiers.
    #[must_use]
    pub fn no_valid_inventory(sources: Vec<String>) -> Self {
        Self::NoValidInventory { sources }
    }

    /// Returns true if this is a structural (parse/validation) error.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Returns true if this is a graph (cycle/dangling-reference) error.
    #[must_use]
    pub const fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }

    /// Returns true if this is the empty-inventory error kind.
    #[must_use]
    pub const fn is_no_valid_inventory(&self) -> bool {
        matches!(self, Self::NoValidInventory { .. })
    }
}

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
