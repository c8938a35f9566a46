//! Data values that templates are filled from.
//!
//! [`ScopeValue`] is a small JSON-like tree. Resolvers walk it by path and
//! plugins render it. A [`TypedContent`] value names the plugin that must
//! handle its tag, overriding the default text and loop dispatch.

use std::collections::BTreeMap;
use std::fmt;

/// Key that marks a JSON object as typed content.
pub const TYPE_KEY: &str = "_type";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScopeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ScopeValue>),
    Map(BTreeMap<String, ScopeValue>),
    Typed(TypedContent),
}

/// A value bound to an explicit content type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedContent {
    pub content_type: String,
    pub value: Box<ScopeValue>,
}

impl TypedContent {
    pub fn new(content_type: impl Into<String>, value: ScopeValue) -> Self {
        Self {
            content_type: content_type.into(),
            value: Box::new(value),
        }
    }
}

impl ScopeValue {
    /// Builds a map value from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ScopeValue>,
    {
        ScopeValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Content type carried by typed content.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            ScopeValue::Typed(typed) => Some(&typed.content_type),
            _ => None,
        }
    }

    /// The value with any typed-content wrapper removed.
    pub fn untyped(&self) -> &ScopeValue {
        match self {
            ScopeValue::Typed(typed) => typed.value.untyped(),
            other => other,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ScopeValue]> {
        match self.untyped() {
            ScopeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// `Null` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self.untyped(), ScopeValue::Null | ScopeValue::Bool(false))
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScopeValue::Null => "null",
            ScopeValue::Bool(_) => "boolean",
            ScopeValue::Int(_) | ScopeValue::Float(_) => "number",
            ScopeValue::String(_) => "string",
            ScopeValue::Sequence(_) => "sequence",
            ScopeValue::Map(_) => "map",
            ScopeValue::Typed(_) => "typed content",
        }
    }
}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Null => Ok(()),
            ScopeValue::Bool(b) => write!(f, "{b}"),
            ScopeValue::Int(i) => write!(f, "{i}"),
            ScopeValue::Float(x) => write!(f, "{x}"),
            ScopeValue::String(s) => f.write_str(s),
            ScopeValue::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ScopeValue::Map(_) => write!(f, "{}", serde_json::Value::from(self)),
            ScopeValue::Typed(typed) => write!(f, "{}", typed.value),
        }
    }
}

impl From<serde_json::Value> for ScopeValue {
    /// Objects with a string `_type` key become typed content. Their value is
    /// the `value` key when that is the only other key, and the rest of the
    /// object otherwise.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ScopeValue::Null,
            Value::Bool(b) => ScopeValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ScopeValue::Int(i),
                None => ScopeValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ScopeValue::String(s),
            Value::Array(items) => {
                ScopeValue::Sequence(items.into_iter().map(ScopeValue::from).collect())
            }
            Value::Object(mut object) => {
                let content_type = match object.get(TYPE_KEY) {
                    Some(Value::String(t)) => Some(t.clone()),
                    _ => None,
                };
                match content_type {
                    Some(content_type) => {
                        object.remove(TYPE_KEY);
                        let inner = if object.len() == 1 && object.contains_key("value") {
                            object
                                .remove("value")
                                .map(ScopeValue::from)
                                .unwrap_or_default()
                        } else {
                            ScopeValue::from(Value::Object(object))
                        };
                        ScopeValue::Typed(TypedContent::new(content_type, inner))
                    }
                    None => ScopeValue::Map(
                        object
                            .into_iter()
                            .map(|(k, v)| (k, ScopeValue::from(v)))
                            .collect(),
                    ),
                }
            }
        }
    }
}

impl From<&ScopeValue> for serde_json::Value {
    fn from(value: &ScopeValue) -> Self {
        use serde_json::Value;
        match value {
            ScopeValue::Null => Value::Null,
            ScopeValue::Bool(b) => Value::Bool(*b),
            ScopeValue::Int(i) => Value::from(*i),
            ScopeValue::Float(x) => Value::from(*x),
            ScopeValue::String(s) => Value::String(s.clone()),
            ScopeValue::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            ScopeValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
            ScopeValue::Typed(typed) => {
                let mut object = serde_json::Map::new();
                object.insert(TYPE_KEY.to_string(), Value::String(typed.content_type.clone()));
                object.insert("value".to_string(), Value::from(typed.value.as_ref()));
                Value::Object(object)
            }
        }
    }
}

impl From<&str> for ScopeValue {
    fn from(value: &str) -> Self {
        ScopeValue::String(value.to_string())
    }
}

impl From<String> for ScopeValue {
    fn from(value: String) -> Self {
        ScopeValue::String(value)
    }
}

impl From<bool> for ScopeValue {
    fn from(value: bool) -> Self {
        ScopeValue::Bool(value)
    }
}

impl From<i64> for ScopeValue {
    fn from(value: i64) -> Self {
        ScopeValue::Int(value)
    }
}

impl From<f64> for ScopeValue {
    fn from(value: f64) -> Self {
        ScopeValue::Float(value)
    }
}

impl<T: Into<ScopeValue>> From<Vec<T>> for ScopeValue {
    fn from(items: Vec<T>) -> Self {
        ScopeValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<TypedContent> for ScopeValue {
    fn from(value: TypedContent) -> Self {
        ScopeValue::Typed(value)
    }
}
