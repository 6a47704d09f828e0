use rehydrate_schema::EntitySchema;
use rehydrate_value::{Container, EntityId, PathSegment, Shape};

/// A reference resolved to its canonical entity.
#[derive(Debug, Clone)]
pub struct Resolved<V> {
    pub entity: V,
    /// `None` for embedded entities whose id rule yields nothing; those are not memoized.
    pub id: Option<EntityId>,
}

/// Resolves an id or embedded entity against the store.
///
/// Mappings are taken as already embedded and keep their own attributes. Scalars are ids looked
/// up under `store[schema.key()][id]`. Returns `None` when there is nothing to resolve to.
pub fn resolve<V: Container>(value: &V, store: &V, schema: &EntitySchema) -> Option<Resolved<V>> {
    match value.shape() {
        Shape::Mapping => Some(Resolved {
            entity: value.clone(),
            id: schema.id_of(value),
        }),
        Shape::Scalar => {
            let id = value.as_entity_id()?;
            let entity = lookup(store, schema.key(), &id)?;
            Some(Resolved {
                entity,
                id: Some(id),
            })
        }
        Shape::Null | Shape::Sequence => None,
    }
}

/// Reads `store[key][id]`. A missing or null record is reported as absent.
pub fn lookup<V: Container>(store: &V, key: &str, id: &EntityId) -> Option<V> {
    let record = store
        .get_at_path(&[PathSegment::key(key), PathSegment::from(id)])
        .filter(|record| !record.is_null());
    if record.is_none() {
        log::debug!("no {key} record with id '{id}' in store");
    }
    record
}
