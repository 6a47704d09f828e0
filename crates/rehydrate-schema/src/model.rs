use indexmap::IndexMap;
use rehydrate_value::AttributeSource;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::{fmt, sync::Arc};

/// Attribute names starting with this prefix carry schema metadata and are never traversed.
pub const METADATA_PREFIX: char = '$';

/// Attribute read from union values when no discriminator is configured.
pub const DEFAULT_DISCRIMINATOR: &str = "type";

/// Marker the normalizer writes on union references (`{"id": 1, "schema": "post"}`).
pub const UNION_SCHEMA_MARKER: &str = "schema";

const TAG_ENTITY: &str = "$entity";
const TAG_COLLECTION: &str = "$collection";
const TAG_LIST: &str = "$list";
const TAG_VALUES: &str = "$values";
const TAG_UNION: &str = "$union";
const TAG_DISCRIMINATOR: &str = "$discriminator";

pub fn is_metadata_key(name: &str) -> bool {
    name.starts_with(METADATA_PREFIX)
}

/// A schema node.
#[derive(Debug, Clone)]
pub enum Schema {
    Entity(EntityRef),
    Collection(CollectionSchema),
    Union(UnionSchema),
    Plain(PlainSchema),
    /// Terminal node; values under it pass through untouched.
    Leaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Entity,
    Collection,
    Union,
    Plain,
    Leaf,
}

/// Reference to an entity type registered in a [`crate::SchemaIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub key: String,
}

/// Ordered or keyed collection; the value's own shape decides which.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub items: Box<Schema>,
}

#[derive(Debug, Clone)]
pub struct UnionSchema {
    pub members: IndexMap<String, Schema>,
    pub discriminator: Discriminator,
}

#[derive(Debug, Clone, Default)]
pub struct PlainSchema {
    pub attributes: IndexMap<String, Schema>,
}

pub type DiscriminatorFn = Arc<dyn Fn(&dyn AttributeSource) -> Option<String> + Send + Sync>;

/// How a union value names the member schema that applies to it.
#[derive(Clone)]
pub enum Discriminator {
    Attribute(String),
    Accessor(DiscriminatorFn),
}

impl Schema {
    pub fn entity(key: impl Into<String>) -> Self {
        Schema::Entity(EntityRef { key: key.into() })
    }

    pub fn collection(items: Schema) -> Self {
        Schema::Collection(CollectionSchema {
            items: Box::new(items),
        })
    }

    pub fn union<K, I>(members: I, discriminator: impl Into<String>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Schema::Union(UnionSchema::new(members, discriminator))
    }

    pub fn plain<K, I>(attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Schema::Plain(PlainSchema {
            attributes: attributes
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        })
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Entity(_) => SchemaKind::Entity,
            Schema::Collection(_) => SchemaKind::Collection,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Plain(_) => SchemaKind::Plain,
            Schema::Leaf => SchemaKind::Leaf,
        }
    }

    /// Classifies a JSON schema document.
    ///
    /// Objects carrying a recognised tag become entity, collection or union nodes. Every other
    /// object is a plain structure whose non-metadata keys are nested schemas, and anything that
    /// is not an object is a leaf.
    pub fn from_json(value: &JsonValue) -> Schema {
        let JsonValue::Object(map) = value else {
            return Schema::Leaf;
        };
        if let Some(JsonValue::String(key)) = map.get(TAG_ENTITY) {
            return Schema::entity(key.as_str());
        }
        for tag in [TAG_COLLECTION, TAG_LIST, TAG_VALUES] {
            if let Some(items) = map.get(tag) {
                return Schema::collection(Schema::from_json(items));
            }
        }
        if let Some(JsonValue::Object(members)) = map.get(TAG_UNION) {
            let discriminator = match map.get(TAG_DISCRIMINATOR) {
                Some(JsonValue::String(attribute)) => attribute.clone(),
                _ => DEFAULT_DISCRIMINATOR.to_string(),
            };
            return Schema::union(
                members
                    .iter()
                    .map(|(name, member)| (name.as_str(), Schema::from_json(member))),
                discriminator,
            );
        }
        Schema::plain(
            map.iter()
                .filter(|(name, _)| !is_metadata_key(name))
                .map(|(name, nested)| (name.as_str(), Schema::from_json(nested))),
        )
    }

    /// Renders the node back into its JSON document form. Accessor discriminators have no
    /// document form and yield `None`.
    pub fn to_json(&self) -> Option<JsonValue> {
        let mut out = JsonMap::new();
        match self {
            Schema::Leaf => return Some(JsonValue::Null),
            Schema::Entity(reference) => {
                out.insert(TAG_ENTITY.into(), JsonValue::String(reference.key.clone()));
            }
            Schema::Collection(collection) => {
                out.insert(TAG_COLLECTION.into(), collection.items.to_json()?);
            }
            Schema::Union(union) => {
                let Discriminator::Attribute(attribute) = &union.discriminator else {
                    return None;
                };
                let mut members = JsonMap::new();
                for (name, member) in &union.members {
                    members.insert(name.clone(), member.to_json()?);
                }
                out.insert(TAG_UNION.into(), JsonValue::Object(members));
                out.insert(
                    TAG_DISCRIMINATOR.into(),
                    JsonValue::String(attribute.clone()),
                );
            }
            Schema::Plain(plain) => {
                for (name, nested) in &plain.attributes {
                    out.insert(name.clone(), nested.to_json()?);
                }
            }
        }
        Some(JsonValue::Object(out))
    }
}

impl UnionSchema {
    pub fn new<K, I>(members: I, discriminator: impl Into<String>) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        UnionSchema {
            members: members
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            discriminator: Discriminator::Attribute(discriminator.into()),
        }
    }

    pub fn with_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&dyn AttributeSource) -> Option<String> + Send + Sync + 'static,
    {
        self.discriminator = Discriminator::Accessor(Arc::new(accessor));
        self
    }

    /// Member key for `value`: the configured discriminator first, then the normalizer's
    /// `schema` marker.
    pub fn member_key(&self, value: &dyn AttributeSource) -> Option<MemberKey> {
        let configured = match &self.discriminator {
            Discriminator::Attribute(attribute) => value
                .attribute_id(attribute)
                .map(|id| id.into_string()),
            Discriminator::Accessor(accessor) => accessor(value),
        };
        if let Some(name) = configured {
            return Some(MemberKey::Discriminator(name));
        }
        value
            .attribute_id(UNION_SCHEMA_MARKER)
            .map(|id| MemberKey::Marker(id.into_string()))
    }

    pub fn member(&self, key: &str) -> Option<&Schema> {
        self.members.get(key)
    }
}

/// Member selected for a union value, tagged by where the key was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKey {
    /// Read through the configured discriminator; the value is the member entity itself.
    Discriminator(String),
    /// Read from the `schema` marker; the value only references a stored entity.
    Marker(String),
}

impl MemberKey {
    pub fn name(&self) -> &str {
        match self {
            MemberKey::Discriminator(name) | MemberKey::Marker(name) => name,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, MemberKey::Marker(_))
    }
}

impl fmt::Debug for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::Attribute(attribute) => {
                f.debug_tuple("Attribute").field(attribute).finish()
            }
            Discriminator::Accessor(_) => f.write_str("Accessor(<fn>)"),
        }
    }
}

impl From<EntityRef> for Schema {
    fn from(value: EntityRef) -> Self {
        Schema::Entity(value)
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json()
            .ok_or_else(|| {
                serde::ser::Error::custom("union discriminator accessors cannot be serialized")
            })?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        JsonValue::deserialize(deserializer).map(|value| Schema::from_json(&value))
    }
}
