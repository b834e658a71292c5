use std::fmt;

use serde::{Deserialize, Serialize};

use super::ElementId;

/// Value of a single element attribute.
///
/// References hold the id of another element verbatim. They are never
/// resolved to the referenced element, so comparing two references is a
/// string comparison regardless of whether the target exists.
///
/// Serialized untagged; a string always deserializes as [`AttributeValue::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    Reference(ElementId),
}

impl AttributeValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// The referenced id when this value can name an element.
    ///
    /// Text values count as references too: a reference field populated
    /// with plain text still names its target by id.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(id) => Some(id.as_str()),
            Self::Text(text) => Some(text.as_str()),
            Self::Bool(_) | Self::Integer(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Reference(id) => Some(id.as_str()),
            Self::Bool(_) | Self::Integer(_) => None,
        }
    }
}

impl From<ElementId> for AttributeValue {
    fn from(id: ElementId) -> Self {
        Self::Reference(id)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::Reference(id) => write!(f, "#{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_serializes_as_plain_id() {
        let value = AttributeValue::Reference("Task_1".parse().unwrap());
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"Task_1\"");
        assert_eq!(serde_json::to_string(&AttributeValue::Bool(true)).unwrap(), "true");
    }

    #[test]
    fn text_and_reference_name_the_same_target() {
        let text = AttributeValue::text("Gateway_1");
        let reference = AttributeValue::Reference("Gateway_1".parse().unwrap());
        assert_ne!(text, reference);
        assert_eq!(text.as_reference(), reference.as_reference());
        assert_eq!(AttributeValue::Integer(3).as_reference(), None);
    }
}
