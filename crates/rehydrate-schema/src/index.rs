use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{EntitySchema, IdAttribute, Schema, SchemaError, entity::DEFAULT_ID_ATTRIBUTE};

/// Top-level schema documents, discriminated by `$kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$kind", rename_all = "lowercase")]
pub enum SchemaDoc {
    Defentity(DefEntity),
}

/// Document form of an [`EntitySchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefEntity {
    pub name: String,
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    #[serde(default)]
    pub attributes: IndexMap<String, Schema>,
}

fn default_id_attribute() -> String {
    DEFAULT_ID_ATTRIBUTE.to_string()
}

impl TryFrom<DefEntity> for EntitySchema {
    type Error = SchemaError;

    fn try_from(def: DefEntity) -> Result<Self, Self::Error> {
        if def.name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if def.id_attribute.is_empty() {
            return Err(SchemaError::EmptyIdAttribute { name: def.name });
        }
        Ok(EntitySchema::new(def.name)
            .with_id_attribute(def.id_attribute)
            .define(def.attributes))
    }
}

impl EntitySchema {
    /// Document form of this definition. Accessor id rules have no document form.
    pub fn to_def(&self) -> Option<DefEntity> {
        let IdAttribute::Attribute(id_attribute) = self.id_attribute() else {
            return None;
        };
        Some(DefEntity {
            name: self.key().to_string(),
            id_attribute: id_attribute.clone(),
            attributes: self.attributes().clone(),
        })
    }
}

/// Registry of entity definitions keyed by entity type.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    entities: IndexMap<String, EntitySchema>,
}

impl SchemaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(
        entities: impl IntoIterator<Item = EntitySchema>,
    ) -> Result<Self, SchemaError> {
        let mut index = SchemaIndex::new();
        for entity in entities {
            index.insert(entity)?;
        }
        Ok(index)
    }

    pub fn from_defs(defs: impl IntoIterator<Item = DefEntity>) -> Result<Self, SchemaError> {
        let mut index = SchemaIndex::new();
        for def in defs {
            index.insert(EntitySchema::try_from(def)?)?;
        }
        Ok(index)
    }

    /// Loads a JSON array of `defentity` documents (a single document is accepted too).
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let docs: Vec<SchemaDoc> = match value {
            serde_json::Value::Array(_) => serde_json::from_value(value)?,
            single => vec![serde_json::from_value(single)?],
        };
        Self::from_defs(docs.into_iter().map(|doc| match doc {
            SchemaDoc::Defentity(def) => def,
        }))
    }

    pub fn insert(&mut self, entity: EntitySchema) -> Result<(), SchemaError> {
        if self.entities.contains_key(entity.key()) {
            return Err(SchemaError::DuplicateEntity {
                name: entity.key().to_string(),
            });
        }
        self.entities.insert(entity.key().to_string(), entity);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&EntitySchema> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
