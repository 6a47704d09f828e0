use rehydrate_value::{Container, EntityId};
use std::collections::HashMap;

/// Entities denormalized so far, by type and id.
///
/// A slot is reserved before the entity's attributes are resolved, so a reference back to an
/// entity that is still being built finds the reserved value instead of recursing.
#[derive(Debug, Clone)]
pub struct Bag<V> {
    entities: HashMap<String, HashMap<EntityId, V>>,
}

impl<V> Default for Bag<V> {
    fn default() -> Self {
        Bag {
            entities: HashMap::new(),
        }
    }
}

impl<V: Container> Bag<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, id: &EntityId) -> Option<&V> {
        self.entities.get(key)?.get(id)
    }

    pub fn contains(&self, key: &str, id: &EntityId) -> bool {
        self.get(key, id).is_some()
    }

    /// Total number of entities across all types.
    pub fn len(&self) -> usize {
        self.entities.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bagged entity for `(key, id)`, building it with `build` on first sight.
    ///
    /// `build` receives the detached entity, which is already reserved under `(key, id)`, and
    /// returns it filled in. Plain entities are shallow-copied so the store is never written;
    /// persistent entities are shared as-is.
    pub fn get_or_create<F>(&mut self, key: &str, id: EntityId, entity: &V, build: F) -> V
    where
        F: FnOnce(V, &mut Bag<V>) -> V,
    {
        if let Some(existing) = self.get(key, &id) {
            log::trace!("reusing {key}/{id} from bag");
            return existing.clone();
        }
        let slot = if entity.is_persistent() {
            entity.clone()
        } else {
            entity.shallow_copy()
        };
        self.table(key).insert(id.clone(), slot.clone());
        let filled = build(slot, self);
        self.table(key).insert(id, filled.clone());
        filled
    }

    fn table(&mut self, key: &str) -> &mut HashMap<EntityId, V> {
        self.entities.entry(key.to_string()).or_default()
    }
}
