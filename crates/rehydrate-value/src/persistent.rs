use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::{fmt, rc::Rc};

use crate::{Container, EntityId, PathSegment, Shape, ValueError};

/// Copy-on-write value tree.
///
/// Nodes are shared between versions until one of them is updated; `set_at_path` clones only the
/// nodes along the written path, so every other holder keeps seeing the value it had.
#[derive(Clone, PartialEq, Default)]
pub enum PersistentValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Rc<Vec<PersistentValue>>),
    Map(Rc<IndexMap<String, PersistentValue>>),
}

impl PersistentValue {
    pub fn map() -> Self {
        PersistentValue::Map(Rc::new(IndexMap::new()))
    }

    pub fn list() -> Self {
        PersistentValue::List(Rc::new(Vec::new()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ValueError> {
        let json: JsonValue = serde_json::from_str(text)?;
        Ok(PersistentValue::from(json))
    }

    /// Whether both values share the same underlying node.
    pub fn ptr_eq(&self, other: &PersistentValue) -> bool {
        match (self, other) {
            (PersistentValue::List(a), PersistentValue::List(b)) => Rc::ptr_eq(a, b),
            (PersistentValue::Map(a), PersistentValue::Map(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            PersistentValue::Null => JsonValue::Null,
            PersistentValue::Bool(b) => JsonValue::Bool(*b),
            PersistentValue::Number(n) => JsonValue::Number(n.clone()),
            PersistentValue::String(s) => JsonValue::String(s.clone()),
            PersistentValue::List(items) => {
                JsonValue::Array(items.iter().map(PersistentValue::to_json).collect())
            }
            PersistentValue::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    fn child(&self, segment: &PathSegment) -> Option<&PersistentValue> {
        match self {
            PersistentValue::Map(entries) => entries.get(&segment.as_key()),
            PersistentValue::List(items) => items.get(segment.as_index()?),
            _ => None,
        }
    }
}

impl Container for PersistentValue {
    fn is_persistent(&self) -> bool {
        true
    }

    fn shape(&self) -> Shape {
        match self {
            PersistentValue::Null => Shape::Null,
            PersistentValue::Bool(_) | PersistentValue::Number(_) | PersistentValue::String(_) => {
                Shape::Scalar
            }
            PersistentValue::List(_) => Shape::Sequence,
            PersistentValue::Map(_) => Shape::Mapping,
        }
    }

    fn as_entity_id(&self) -> Option<EntityId> {
        match self {
            PersistentValue::String(s) => Some(EntityId::new(s.as_str())),
            PersistentValue::Number(n) => Some(EntityId::from_number(n)),
            PersistentValue::Bool(b) => Some(EntityId::new(b.to_string())),
            _ => None,
        }
    }

    fn get_at_path(&self, path: &[PathSegment]) -> Option<Self> {
        let mut current = self;
        for segment in path {
            current = current.child(segment)?;
        }
        Some(current.clone())
    }

    fn set_at_path(self, path: &[PathSegment], value: Self) -> Self {
        let Some((head, rest)) = path.split_first() else {
            return value;
        };
        match self {
            PersistentValue::Map(mut entries) => {
                let key = head.as_key();
                let map = Rc::make_mut(&mut entries);
                let updated = if rest.is_empty() {
                    value
                } else {
                    let current = match map.get_mut(&key) {
                        Some(slot) => std::mem::take(slot),
                        None => PersistentValue::map(),
                    };
                    current.set_at_path(rest, value)
                };
                map.insert(key, updated);
                PersistentValue::Map(entries)
            }
            PersistentValue::List(mut items) => {
                let Some(index) = head.as_index() else {
                    return PersistentValue::List(items);
                };
                let list = Rc::make_mut(&mut items);
                if index >= list.len() {
                    list.resize(index + 1, PersistentValue::Null);
                }
                let updated = if rest.is_empty() {
                    value
                } else {
                    std::mem::take(&mut list[index]).set_at_path(rest, value)
                };
                list[index] = updated;
                PersistentValue::List(items)
            }
            scalar => scalar,
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            PersistentValue::Map(entries) => entries.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn len(&self) -> usize {
        match self {
            PersistentValue::List(items) => items.len(),
            _ => 0,
        }
    }

    fn shallow_copy(&self) -> Self {
        // Updates never reach other holders, so sharing the node is already a copy.
        self.clone()
    }
}

impl From<JsonValue> for PersistentValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => PersistentValue::Null,
            JsonValue::Bool(b) => PersistentValue::Bool(b),
            JsonValue::Number(n) => PersistentValue::Number(n),
            JsonValue::String(s) => PersistentValue::String(s),
            JsonValue::Array(items) => {
                PersistentValue::List(Rc::new(items.into_iter().map(Self::from).collect()))
            }
            JsonValue::Object(entries) => PersistentValue::Map(Rc::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            )),
        }
    }
}

impl From<&str> for PersistentValue {
    fn from(value: &str) -> Self {
        PersistentValue::String(value.to_string())
    }
}

impl From<i64> for PersistentValue {
    fn from(value: i64) -> Self {
        PersistentValue::Number(value.into())
    }
}

impl From<i32> for PersistentValue {
    fn from(value: i32) -> Self {
        PersistentValue::Number(value.into())
    }
}

impl fmt::Debug for PersistentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for PersistentValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PersistentValue::Null => serializer.serialize_unit(),
            PersistentValue::Bool(b) => serializer.serialize_bool(*b),
            PersistentValue::Number(n) => n.serialize(serializer),
            PersistentValue::String(s) => serializer.serialize_str(s),
            PersistentValue::List(items) => serializer.collect_seq(items.iter()),
            PersistentValue::Map(entries) => serializer.collect_map(entries.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for PersistentValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        JsonValue::deserialize(deserializer).map(PersistentValue::from)
    }
}
