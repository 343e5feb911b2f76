use std::collections::HashMap;

use glam::Vec2;

use crate::entity::{factory, Entity, EntityId};
use crate::registry::EntityKind;

/// The authoritative live entity set. Ids are assigned monotonically and
/// never reused within a session; removal is observed by the serializer at
/// flush time by diffing the live id set, so the world itself keeps no
/// removal log.
#[derive(Debug, Default)]
pub struct World {
    entities: HashMap<EntityId, Entity>,
    next_id: EntityId,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.entities.insert(id, factory::spawn(id, kind));
        id
    }

    pub fn spawn_at(&mut self, kind: EntityKind, position: Vec2) -> EntityId {
        let id = self.spawn(kind);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_position(position);
        }
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Live ids in ascending order; flush output is deterministic.
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
