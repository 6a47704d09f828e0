use indexmap::IndexMap;
use rehydrate_value::{AttributeSource, EntityId};
use std::{fmt, sync::Arc};

use crate::{Schema, is_metadata_key};

pub const DEFAULT_ID_ATTRIBUTE: &str = "id";

pub type IdAccessor = Arc<dyn Fn(&dyn AttributeSource) -> Option<EntityId> + Send + Sync>;

/// How an embedded entity exposes its id.
#[derive(Clone)]
pub enum IdAttribute {
    Attribute(String),
    Accessor(IdAccessor),
}

/// Definition of one entity type: its store key, id rule and attribute schemas.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    key: String,
    id_attribute: IdAttribute,
    attributes: IndexMap<String, Schema>,
}

impl EntitySchema {
    pub fn new(key: impl Into<String>) -> Self {
        EntitySchema {
            key: key.into(),
            id_attribute: IdAttribute::Attribute(DEFAULT_ID_ATTRIBUTE.to_string()),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.id_attribute = IdAttribute::Attribute(attribute.into());
        self
    }

    pub fn with_id_accessor<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&dyn AttributeSource) -> Option<EntityId> + Send + Sync + 'static,
    {
        self.id_attribute = IdAttribute::Accessor(Arc::new(accessor));
        self
    }

    /// Adds (or replaces) attribute schemas. Metadata-prefixed names are dropped.
    pub fn define<K, I>(mut self, attributes: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        for (name, schema) in attributes {
            let name = name.into();
            if !is_metadata_key(&name) {
                self.attributes.insert(name, schema);
            }
        }
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id_attribute(&self) -> &IdAttribute {
        &self.id_attribute
    }

    pub fn attributes(&self) -> &IndexMap<String, Schema> {
        &self.attributes
    }

    /// Id of an embedded entity: the configured rule, falling back to its `id` attribute.
    pub fn id_of(&self, entity: &dyn AttributeSource) -> Option<EntityId> {
        let configured = match &self.id_attribute {
            IdAttribute::Attribute(attribute) => entity.attribute_id(attribute),
            IdAttribute::Accessor(accessor) => accessor(entity),
        };
        configured.or_else(|| entity.attribute_id(DEFAULT_ID_ATTRIBUTE))
    }
}

impl fmt::Debug for IdAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdAttribute::Attribute(attribute) => {
                f.debug_tuple("Attribute").field(attribute).finish()
            }
            IdAttribute::Accessor(_) => f.write_str("Accessor(<fn>)"),
        }
    }
}
