use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// Largest magnitude below which every whole `f64` is an exact integer (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Identifier of an entity inside its type's table.
///
/// Ids compare by their string form, so the number `1` and the string `"1"` address the same
/// record. An empty string is a valid id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        EntityId(value.into())
    }

    /// Canonical string form of a JSON number. Whole floats drop their fraction so `1.0` and `1`
    /// land on the same id.
    pub fn from_number(number: &serde_json::Number) -> Self {
        if let Some(int) = number.as_i64() {
            return EntityId(int.to_string());
        }
        if let Some(nat) = number.as_u64() {
            return EntityId(nat.to_string());
        }
        match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() <= MAX_EXACT_FLOAT => {
                EntityId(format!("{}", float as i64))
            }
            _ => EntityId(number.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId(value.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        EntityId(value.to_string())
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId(value.to_string())
    }
}

/// One step of a container path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn key(key: impl Into<String>) -> Self {
        PathSegment::Key(key.into())
    }

    /// Key used when addressing a mapping. Indices address mappings by their decimal form.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Key(key) => key.clone(),
            PathSegment::Index(index) => index.to_string(),
        }
    }

    /// Index used when addressing a sequence. Keys that parse as an index are accepted.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(key) => key.parse().ok(),
            PathSegment::Index(index) => Some(*index),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

impl From<&EntityId> for PathSegment {
    fn from(value: &EntityId) -> Self {
        PathSegment::Key(value.as_str().to_string())
    }
}
