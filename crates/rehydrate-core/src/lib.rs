//! Rebuilds nested documents from a normalized entity store.
//!
//! The store maps entity type to id to record; a [`Schema`] says which attributes reference
//! which entity types. [`denormalize`] walks a value against its schema and replaces every
//! resolvable reference with the referenced entity, itself denormalized. Entities are built once
//! per call through a [`Bag`], which also makes cyclic references terminate.
//!
//! The walker is generic over [`Container`], so the same code serves shared mutable values
//! ([`rehydrate_value::PlainValue`]) and copy-on-write values
//! ([`rehydrate_value::PersistentValue`]).

mod bag;
mod resolve;
mod walk;

pub use bag::Bag;
pub use resolve::{Resolved, lookup, resolve};
pub use walk::Denormalizer;

pub use rehydrate_schema::{Schema, SchemaIndex};
pub use rehydrate_value::Container;

/// Denormalizes `value` with a fresh bag. `None` (an absent value) stays `None`.
pub fn denormalize<V: Container>(
    value: Option<&V>,
    store: &V,
    schema: &Schema,
    schemas: &SchemaIndex,
) -> Option<V> {
    Denormalizer::new(schemas).denormalize(value, store, schema)
}

/// Denormalizes `value` through a caller-owned bag, so entities built by earlier calls are
/// reused instead of rebuilt.
pub fn denormalize_with_bag<V: Container>(
    value: Option<&V>,
    store: &V,
    schema: &Schema,
    schemas: &SchemaIndex,
    bag: &mut Bag<V>,
) -> Option<V> {
    Denormalizer::new(schemas).denormalize_with_bag(value, store, schema, bag)
}
