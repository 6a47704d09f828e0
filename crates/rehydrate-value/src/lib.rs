//! Value containers and the path-access capability the denormalizer is written against.
//!
//! Two container disciplines are provided: [`PlainValue`] shares mutable nodes and updates them
//! in place, while [`PersistentValue`] is copy-on-write and never changes a value another holder
//! can observe. Both implement [`Container`].

mod id;
mod persistent;
mod plain;

pub use id::{EntityId, PathSegment};
pub use persistent::PersistentValue;
pub use plain::PlainValue;

/// Structural classification of a container value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Scalar,
    Sequence,
    Mapping,
}

/// Path access plus the handful of structural queries needed to walk a value graph.
///
/// `set_at_path` follows the container's discipline: plain containers write in place and hand
/// back the same node, persistent containers return an updated copy and leave `self` untouched
/// for every other holder.
pub trait Container: Clone + std::fmt::Debug {
    /// Whether updates produce new values instead of mutating shared nodes.
    fn is_persistent(&self) -> bool;

    fn shape(&self) -> Shape;

    /// Interprets a scalar as an entity identifier. Mappings, sequences and null yield `None`.
    fn as_entity_id(&self) -> Option<EntityId>;

    fn get_at_path(&self, path: &[PathSegment]) -> Option<Self>;

    fn set_at_path(self, path: &[PathSegment], value: Self) -> Self;

    /// Keys of a mapping in insertion order; empty for every other shape.
    fn keys(&self) -> Vec<String>;

    /// Element count of a sequence; zero for every other shape.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the top-level node so writes to the copy do not reach the original. Children stay
    /// shared.
    fn shallow_copy(&self) -> Self;

    fn is_null(&self) -> bool {
        self.shape() == Shape::Null
    }

    fn get(&self, key: &str) -> Option<Self> {
        self.get_at_path(&[PathSegment::key(key)])
    }
}

/// Read-only attribute view handed to id and discriminator accessors.
pub trait AttributeSource {
    /// Reads a scalar attribute as an entity id (strings, numbers and booleans are coerced).
    fn attribute_id(&self, name: &str) -> Option<EntityId>;
}

impl<V: Container> AttributeSource for V {
    fn attribute_id(&self, name: &str) -> Option<EntityId> {
        self.get(name).and_then(|value| value.as_entity_id())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("value graph contains a cycle at {path}")]
    Cycle { path: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn render_path(path: &[PathSegment]) -> String {
    if path.is_empty() {
        return "/".into();
    }
    path.iter().map(|segment| format!("/{segment}")).collect()
}
