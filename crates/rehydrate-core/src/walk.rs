use indexmap::IndexMap;
use rehydrate_schema::{
    EntityRef, EntitySchema, Schema, SchemaIndex, UnionSchema, is_metadata_key,
};
use rehydrate_value::{Container, EntityId, PathSegment, Shape};

use crate::{
    bag::Bag,
    resolve::{Resolved, lookup, resolve},
};

/// Walks values against schemas, resolving entity references through a [`SchemaIndex`].
#[derive(Debug, Clone, Copy)]
pub struct Denormalizer<'s> {
    schemas: &'s SchemaIndex,
}

impl<'s> Denormalizer<'s> {
    pub fn new(schemas: &'s SchemaIndex) -> Self {
        Denormalizer { schemas }
    }

    pub fn denormalize<V: Container>(
        &self,
        value: Option<&V>,
        store: &V,
        schema: &Schema,
    ) -> Option<V> {
        let mut bag = Bag::new();
        self.denormalize_with_bag(value, store, schema, &mut bag)
    }

    pub fn denormalize_with_bag<V: Container>(
        &self,
        value: Option<&V>,
        store: &V,
        schema: &Schema,
        bag: &mut Bag<V>,
    ) -> Option<V> {
        value.map(|value| self.walk(value, store, schema, bag))
    }

    fn walk<V: Container>(&self, value: &V, store: &V, schema: &Schema, bag: &mut Bag<V>) -> V {
        if value.is_null() {
            return value.clone();
        }
        match schema {
            Schema::Leaf => value.clone(),
            Schema::Entity(reference) => self.walk_entity(value, store, reference, bag),
            Schema::Collection(collection) => {
                self.walk_collection(value, store, &collection.items, bag)
            }
            Schema::Union(union) => self.walk_union(value, store, union, bag),
            Schema::Plain(plain) => {
                self.fill_attributes(value.shallow_copy(), store, &plain.attributes, bag)
            }
        }
    }

    fn walk_entity<V: Container>(
        &self,
        value: &V,
        store: &V,
        reference: &EntityRef,
        bag: &mut Bag<V>,
    ) -> V {
        let Some(schema) = self.schemas.get(&reference.key) else {
            log::debug!("entity type '{}' is not defined", reference.key);
            return value.clone();
        };
        match resolve(value, store, schema) {
            Some(resolved) => self.build_entity(schema, resolved, store, bag),
            None => value.clone(),
        }
    }

    fn build_entity<V: Container>(
        &self,
        schema: &EntitySchema,
        resolved: Resolved<V>,
        store: &V,
        bag: &mut Bag<V>,
    ) -> V {
        let attributes = schema.attributes();
        match resolved.id {
            Some(id) => bag.get_or_create(schema.key(), id, &resolved.entity, |slot, bag| {
                self.fill_attributes(slot, store, attributes, bag)
            }),
            None => self.fill_attributes(resolved.entity.shallow_copy(), store, attributes, bag),
        }
    }

    fn walk_collection<V: Container>(
        &self,
        value: &V,
        store: &V,
        items: &Schema,
        bag: &mut Bag<V>,
    ) -> V {
        let paths: Vec<PathSegment> = match value.shape() {
            Shape::Sequence => (0..value.len()).map(PathSegment::Index).collect(),
            Shape::Mapping => value.keys().into_iter().map(PathSegment::Key).collect(),
            Shape::Null | Shape::Scalar => return value.clone(),
        };
        let mut out = value.shallow_copy();
        for segment in paths {
            let path = [segment];
            let Some(item) = value.get_at_path(&path) else {
                continue;
            };
            let item = self.walk(&item, store, items, bag);
            out = out.set_at_path(&path, item);
        }
        out
    }

    fn walk_union<V: Container>(
        &self,
        value: &V,
        store: &V,
        union: &UnionSchema,
        bag: &mut Bag<V>,
    ) -> V {
        let Some(member_key) = union.member_key(value) else {
            log::debug!("union value carries no discriminator");
            return value.clone();
        };
        let Some(member) = union.member(member_key.name()) else {
            log::debug!("union has no member '{}'", member_key.name());
            return value.clone();
        };
        // A union value is a tagged reference; the record it names replaces it.
        if let Some((schema, id)) = self.member_entity(value, member) {
            if let Some(entity) = lookup(store, schema.key(), &id) {
                let resolved = Resolved {
                    entity,
                    id: Some(id),
                };
                return self.build_entity(schema, resolved, store, bag);
            }
        }
        // A marker-tagged value is only a reference, never the entity it names.
        if member_key.is_reference() && matches!(member, Schema::Entity(_)) {
            return value.clone();
        }
        self.walk(value, store, member, bag)
    }

    fn member_entity<V: Container>(
        &self,
        value: &V,
        member: &Schema,
    ) -> Option<(&'s EntitySchema, EntityId)> {
        let Schema::Entity(reference) = member else {
            return None;
        };
        if value.shape() != Shape::Mapping {
            return None;
        }
        let schema = self.schemas.get(&reference.key)?;
        let id = schema.id_of(value)?;
        Some((schema, id))
    }

    /// Denormalizes each schema attribute present on `target` and writes it back in place.
    /// Attributes the schema does not mention are left as they are.
    fn fill_attributes<V: Container>(
        &self,
        mut target: V,
        store: &V,
        attributes: &IndexMap<String, Schema>,
        bag: &mut Bag<V>,
    ) -> V {
        for (name, schema) in attributes {
            if is_metadata_key(name) {
                continue;
            }
            let path = [PathSegment::key(name.as_str())];
            let Some(item) = target.get_at_path(&path) else {
                continue;
            };
            let item = self.walk(&item, store, schema, bag);
            target = target.set_at_path(&path, item);
        }
        target
    }
}
