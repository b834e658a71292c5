use std::{borrow::Borrow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an element, unique within a model.
///
/// The id is the identity key across model versions: two elements in
/// different snapshots are "the same element" exactly when their ids match.
/// An id is never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementId(String);

/// Returned when constructing an [`ElementId`] from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("element id must not be empty")]
pub struct EmptyIdError;

impl ElementId {
    /// Create an id, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptyIdError);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ElementId {
    type Err = EmptyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ElementId {
    type Error = EmptyIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets id-keyed maps be queried with a plain `&str`.
impl Borrow<str> for ElementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
