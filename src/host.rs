//! Hosts and their connection metadata.

use serde::{Deserialize, Serialize};

use crate::value::{Value, Vars};

/// Connection metadata attached to a host.
///
/// These values are opaque pass-through data: the resolver stores and
/// serializes them but never interprets them. Parsers populate the fields
/// from natively named variable keys and from the legacy `ansible_*`
/// aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl ConnectionInfo {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hostname.is_none()
            && self.port.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.platform.is_none()
    }

    /// Overlays `other` onto this info: set fields in `other` win, unset
    /// fields keep the existing value.
    #[must_use]
    pub fn overlaid(&self, other: &Self) -> Self {
        Self {
            hostname: other.hostname.clone().or_else(|| self.hostname.clone()),
            port: other.port.or(self.port),
            username: other.username.clone().or_else(|| self.username.clone()),
            password: other.password.clone().or_else(|| self.password.clone()),
            platform: other.platform.clone().or_else(|| self.platform.clone()),
        }
    }
}

/// A host declaration: identity, group memberships, and variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Unique host identifier within an inventory.
    pub name: String,

    /// Direct group memberships, in declared order. Order matters for
    /// precedence; duplicates collapse to the first occurrence.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Host-scoped variables (highest precedence).
    #[serde(default)]
    pub vars: Vars,

    /// Opaque connection metadata.
    #[serde(default, skip_serializing_if = "ConnectionInfo::is_empty")]
    pub connection: ConnectionInfo,
}

impl Host {
    /// Creates an empty host with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            vars: Vars::new(),
            connection: ConnectionInfo::default(),
        }
    }

    /// Appends a group membership, keeping declared order and ignoring
    /// duplicates.
    pub fn push_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        if !self.groups.iter().any(|g| *g == group) {
            self.groups.push(group);
        }
    }

    /// Sets a host variable.
    pub fn set_var(&mut self, key: impl Into<String>, value: Value) {
        self.vars.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_group_keeps_order_and_dedups() {
        let mut host = Host::new("web1");
        host.push_group("web");
        host.push_group("dc1");
        host.push_group("web");
        assert_eq!(host.groups, vec!["web", "dc1"]);
    }

    #[test]
    fn connection_overlay_per_field() {
        let base = ConnectionInfo {
            hostname: Some("10.0.0.1".to_string()),
            port: Some(22),
            ..ConnectionInfo::default()
        };
        let overlay = ConnectionInfo {
            port: Some(2222),
            username: Some("ops".to_string()),
            ..ConnectionInfo::default()
        };

        let merged = base.overlaid(&overlay);
        assert_eq!(merged.hostname.as_deref(), Some("10.0.0.1"));
        assert_eq!(merged.port, Some(2222));
        assert_eq!(merged.username.as_deref(), Some("ops"));
        assert!(merged.password.is_none());
    }

    #[test]
    fn empty_connection_skipped_in_serialization() {
        let host = Host::new("h");
        let json = serde_json::to_string(&host).unwrap();
        assert!(!json.contains("connection"));

        let back: Host = serde_json::from_str(&json).unwrap();
        assert_eq!(host, back);
    }
}
