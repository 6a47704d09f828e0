use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::{cell::RefCell, collections::HashSet, fmt, rc::Rc};

use crate::{Container, EntityId, PathSegment, Shape, ValueError, render_path};

/// Mutable value graph whose sequences and mappings are shared nodes.
///
/// Cloning a `PlainValue` clones the handle, not the node: both handles observe every later write.
/// This is what lets a denormalized graph point back at an entity that is still being filled in.
/// Graphs built that way may contain reference cycles; use [`PlainValue::release_graph`] to
/// break them once the graph is no longer needed.
#[derive(Clone, Default)]
pub enum PlainValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Rc<RefCell<Vec<PlainValue>>>),
    Object(Rc<RefCell<IndexMap<String, PlainValue>>>),
}

impl PlainValue {
    pub fn object() -> Self {
        PlainValue::Object(Rc::new(RefCell::new(IndexMap::new())))
    }

    pub fn array() -> Self {
        PlainValue::Array(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn from_json_str(text: &str) -> Result<Self, ValueError> {
        let json: JsonValue = serde_json::from_str(text)?;
        Ok(PlainValue::from(json))
    }

    /// Whether both handles point at the same sequence or mapping node.
    pub fn ptr_eq(&self, other: &PlainValue) -> bool {
        match (self, other) {
            (PlainValue::Array(a), PlainValue::Array(b)) => Rc::ptr_eq(a, b),
            (PlainValue::Object(a), PlainValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Deep conversion to JSON. Shared nodes are expanded at every occurrence; a node that
    /// contains itself fails with [`ValueError::Cycle`].
    pub fn to_json(&self) -> Result<JsonValue, ValueError> {
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        self.to_json_inner(&mut ancestors, &mut path)
    }

    /// Empties every node reachable from this handle, dropping the references that keep cyclic
    /// graphs alive.
    pub fn release_graph(&self) {
        let mut seen = HashSet::new();
        self.release_inner(&mut seen);
    }

    fn node_ptr(&self) -> Option<*const ()> {
        match self {
            PlainValue::Array(items) => Some(Rc::as_ptr(items) as *const ()),
            PlainValue::Object(entries) => Some(Rc::as_ptr(entries) as *const ()),
            _ => None,
        }
    }

    fn to_json_inner(
        &self,
        ancestors: &mut Vec<*const ()>,
        path: &mut Vec<PathSegment>,
    ) -> Result<JsonValue, ValueError> {
        let ptr = self.node_ptr();
        if let Some(ptr) = ptr {
            if ancestors.contains(&ptr) {
                return Err(ValueError::Cycle {
                    path: render_path(path),
                });
            }
            ancestors.push(ptr);
        }
        let json = match self {
            PlainValue::Null => JsonValue::Null,
            PlainValue::Bool(b) => JsonValue::Bool(*b),
            PlainValue::Number(n) => JsonValue::Number(n.clone()),
            PlainValue::String(s) => JsonValue::String(s.clone()),
            PlainValue::Array(items) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    out.push(item.to_json_inner(ancestors, path)?);
                    path.pop();
                }
                JsonValue::Array(out)
            }
            PlainValue::Object(entries) => {
                let entries = entries.borrow();
                let mut out = serde_json::Map::new();
                for (key, item) in entries.iter() {
                    path.push(PathSegment::Key(key.clone()));
                    out.insert(key.clone(), item.to_json_inner(ancestors, path)?);
                    path.pop();
                }
                JsonValue::Object(out)
            }
        };
        if ptr.is_some() {
            ancestors.pop();
        }
        Ok(json)
    }

    fn release_inner(&self, seen: &mut HashSet<*const ()>) {
        let Some(ptr) = self.node_ptr() else {
            return;
        };
        if !seen.insert(ptr) {
            return;
        }
        let children: Vec<PlainValue> = match self {
            PlainValue::Array(items) => std::mem::take(&mut *items.borrow_mut()),
            PlainValue::Object(entries) => std::mem::take(&mut *entries.borrow_mut())
                .into_iter()
                .map(|(_, value)| value)
                .collect(),
            _ => Vec::new(),
        };
        for child in &children {
            child.release_inner(seen);
        }
    }

    fn child(&self, segment: &PathSegment) -> Option<PlainValue> {
        match self {
            PlainValue::Object(entries) => entries.borrow().get(&segment.as_key()).cloned(),
            PlainValue::Array(items) => {
                let index = segment.as_index()?;
                items.borrow().get(index).cloned()
            }
            _ => None,
        }
    }

    /// Writes `value` into this node. Returns false when the node cannot hold the segment.
    fn put(&self, segment: &PathSegment, value: PlainValue) -> bool {
        match self {
            PlainValue::Object(entries) => {
                entries.borrow_mut().insert(segment.as_key(), value);
                true
            }
            PlainValue::Array(items) => {
                let Some(index) = segment.as_index() else {
                    return false;
                };
                let mut items = items.borrow_mut();
                if index < items.len() {
                    items[index] = value;
                } else {
                    items.resize(index, PlainValue::Null);
                    items.push(value);
                }
                true
            }
            _ => false,
        }
    }
}

impl Container for PlainValue {
    fn is_persistent(&self) -> bool {
        false
    }

    fn shape(&self) -> Shape {
        match self {
            PlainValue::Null => Shape::Null,
            PlainValue::Bool(_) | PlainValue::Number(_) | PlainValue::String(_) => Shape::Scalar,
            PlainValue::Array(_) => Shape::Sequence,
            PlainValue::Object(_) => Shape::Mapping,
        }
    }

    fn as_entity_id(&self) -> Option<EntityId> {
        match self {
            PlainValue::String(s) => Some(EntityId::new(s.as_str())),
            PlainValue::Number(n) => Some(EntityId::from_number(n)),
            PlainValue::Bool(b) => Some(EntityId::new(b.to_string())),
            _ => None,
        }
    }

    fn get_at_path(&self, path: &[PathSegment]) -> Option<Self> {
        let mut current = self.clone();
        for segment in path {
            current = current.child(segment)?;
        }
        Some(current)
    }

    fn set_at_path(self, path: &[PathSegment], value: Self) -> Self {
        let Some((last, parents)) = path.split_last() else {
            return value;
        };
        let mut node = self.clone();
        for segment in parents {
            node = match node.child(segment) {
                Some(child) if matches!(child.shape(), Shape::Mapping | Shape::Sequence) => child,
                Some(_) => return self,
                None => {
                    let fresh = PlainValue::object();
                    if !node.put(segment, fresh.clone()) {
                        return self;
                    }
                    fresh
                }
            };
        }
        node.put(last, value);
        self
    }

    fn keys(&self) -> Vec<String> {
        match self {
            PlainValue::Object(entries) => entries.borrow().keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn len(&self) -> usize {
        match self {
            PlainValue::Array(items) => items.borrow().len(),
            _ => 0,
        }
    }

    fn shallow_copy(&self) -> Self {
        match self {
            PlainValue::Array(items) => {
                PlainValue::Array(Rc::new(RefCell::new(items.borrow().clone())))
            }
            PlainValue::Object(entries) => {
                PlainValue::Object(Rc::new(RefCell::new(entries.borrow().clone())))
            }
            other => other.clone(),
        }
    }
}

impl From<JsonValue> for PlainValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => PlainValue::Null,
            JsonValue::Bool(b) => PlainValue::Bool(b),
            JsonValue::Number(n) => PlainValue::Number(n),
            JsonValue::String(s) => PlainValue::String(s),
            JsonValue::Array(items) => PlainValue::Array(Rc::new(RefCell::new(
                items.into_iter().map(PlainValue::from).collect(),
            ))),
            JsonValue::Object(entries) => PlainValue::Object(Rc::new(RefCell::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, PlainValue::from(value)))
                    .collect(),
            ))),
        }
    }
}

impl From<&str> for PlainValue {
    fn from(value: &str) -> Self {
        PlainValue::String(value.to_string())
    }
}

impl From<i64> for PlainValue {
    fn from(value: i64) -> Self {
        PlainValue::Number(value.into())
    }
}

impl From<i32> for PlainValue {
    fn from(value: i32) -> Self {
        PlainValue::Number(value.into())
    }
}

impl fmt::Debug for PlainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{json}"),
            Err(_) => f.write_str("<cyclic value>"),
        }
    }
}

impl Serialize for PlainValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}
