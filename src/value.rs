//! Variable values.
//!
//! Inventory variables hold arbitrary nested JSON-like data. The shapes that
//! matter for merging — mapping, sequence, scalar — are explicit variants so
//! the deep-merge cases stay exhaustive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A variable mapping: variable name to value.
///
/// Ordered so serialization is deterministic.
pub type Vars = BTreeMap<String, Value>;

/// Possible values an inventory variable can hold.
///
/// Serialized untagged, so it round-trips ordinary JSON: `null`, booleans,
/// numbers, strings, arrays, and objects.
///
/// # Examples
///
/// ```
/// use rollcall::Value;
///
/// let port = Value::Int(8080);
/// let tags = Value::Sequence(vec![Value::from("edge"), Value::from("lab")]);
///
/// assert!(port.is_int());
/// assert!(tags.is_sequence());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Vars),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    pub const fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Returns true for any non-mapping, non-sequence value.
    pub const fn is_scalar(&self) -> bool {
        !self.is_mapping() && !self.is_sequence()
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub const fn as_mapping(&self) -> Option<&Vars> {
        match self {
            Self::Mapping(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Sequence(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Mapping(v) => {
                write!(f, "{{")?;
                for (i, (k, item)) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Sequence(v)
    }
}

impl From<Vars> for Value {
    fn from(v: Vars) -> Self {
        Self::Mapping(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    // Out-of-range u64 or fractional.
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Converts a JSON object into a [`Vars`] mapping.
///
/// Returns `None` if the value is not an object.
#[must_use]
pub fn vars_from_json(v: serde_json::Value) -> Option<Vars> {
    match v {
        serde_json::Value::Object(entries) => Some(
            entries
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_predicates() {
        assert!(Value::Null.is_null());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::Int(1).is_int());
        assert!(Value::Float(1.5).is_float());
        assert!(Value::from("x").is_string());
        assert!(Value::Sequence(vec![]).is_sequence());
        assert!(Value::Mapping(Vars::new()).is_mapping());

        assert!(Value::Int(1).is_scalar());
        assert!(!Value::Mapping(Vars::new()).is_scalar());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Int(42).as_float(), Some(42.0));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::Int(1).as_mapping().is_none());
        assert_eq!(Value::Int(42).type_name(), "int");
    }

    #[test]
    fn test_untagged_json_roundtrip() {
        let json = r#"{"port":22,"ratio":0.5,"tags":["a","b"],"nested":{"x":null,"on":true}}"#;
        let val: Value = serde_json::from_str(json).unwrap();

        let mapping = val.as_mapping().unwrap();
        assert_eq!(mapping["port"], Value::Int(22));
        assert_eq!(mapping["ratio"], Value::Float(0.5));
        assert_eq!(
            mapping["tags"],
            Value::Sequence(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(mapping["nested"].as_mapping().unwrap()["x"], Value::Null);

        let back = serde_json::to_string(&val).unwrap();
        let reparsed: Value = serde_json::from_str(&back).unwrap();
        assert_eq!(val, reparsed);
    }

    #[test]
    fn test_from_serde_json() {
        let json: serde_json::Value = serde_json::json!({"a": 1, "b": [true, null]});
        let val = Value::from(json);
        let mapping = val.as_mapping().unwrap();
        assert_eq!(mapping["a"], Value::Int(1));
        assert_eq!(
            mapping["b"],
            Value::Sequence(vec![Value::Bool(true), Value::Null])
        );
    }

    #[test]
    fn test_vars_from_json() {
        let obj = serde_json::json!({"k": "v"});
        let vars = vars_from_json(obj).unwrap();
        assert_eq!(vars["k"], Value::from("v"));

        assert!(vars_from_json(serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Value::Null), "null");
        assert_eq!(format!("{}", Value::Int(3)), "3");
        assert_eq!(
            format!("{}", Value::Sequence(vec![Value::Int(1), Value::Int(2)])),
            "[1, 2]"
        );
        let mut vars = Vars::new();
        vars.insert("k".to_string(), Value::from("v"));
        assert_eq!(format!("{}", Value::Mapping(vars)), "{\"k\": \"v\"}");
    }
}
