use std::collections::HashMap;

use horde::{factory, Entity, EntityId, EntityRecord, SpatialGrid, StateFrame};

use crate::interpolation::InterpolationManager;
use crate::prediction::Reconciler;

/// The client's best current approximation of server state. Entities are
/// created, mutated in place, and deleted only in response to decoded
/// frames; the one exception to server authority is the local player's
/// rendered position, which the reconciler may restore after an apply.
/// The spatial grid is updated in the same operation as every mirror
/// mutation, never deferred.
#[derive(Debug, Default)]
pub struct ClientMirror {
    entities: HashMap<EntityId, Entity>,
    grid: SpatialGrid,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.grid.clear();
    }

    /// Full snapshot: the replacement mirror is built off to the side and
    /// swapped in whole, so the renderer never observes a half-populated
    /// world. The local player always snaps on a full resync.
    pub fn apply_full(
        &mut self,
        frame: &StateFrame,
        local_id: Option<EntityId>,
        reconciler: &mut Reconciler,
        interpolation: &mut InterpolationManager,
    ) {
        let mut entities = HashMap::with_capacity(frame.records.len());
        let mut grid = SpatialGrid::default();

        for record in &frame.records {
            let mut entity = factory::spawn(record.id, record.kind);
            apply_record(&mut entity, record);
            entity.clear_dirty();

            if let Some(position) = entity.position() {
                grid.insert(record.id, position);
                if local_id == Some(record.id) {
                    reconciler.snap_to(position);
                } else if let Some(timestamp) = frame.meta.timestamp {
                    interpolation.add_snapshot(record.id, position, timestamp);
                }
            }
            entities.insert(record.id, entity);
        }

        for id in self.entities.keys() {
            if !entities.contains_key(id) {
                interpolation.forget(*id);
            }
        }

        self.entities = entities;
        self.grid = grid;
    }

    /// Incremental frame: removals first, then per-record in-place
    /// mutation. An unseen id inside a delta is constructed through the
    /// factory and seeded from whatever fields the record carries; the
    /// server includes the full set for newly-visible entities.
    pub fn apply_delta(
        &mut self,
        frame: &StateFrame,
        local_id: Option<EntityId>,
        reconciler: &mut Reconciler,
        interpolation: &mut InterpolationManager,
    ) {
        for id in &frame.removed_ids {
            self.entities.remove(id);
            self.grid.remove(*id);
            interpolation.forget(*id);
        }

        for record in &frame.records {
            let entity = self
                .entities
                .entry(record.id)
                .or_insert_with(|| factory::spawn(record.id, record.kind));

            let client_pos = entity.position();
            apply_record(entity, record);
            entity.clear_dirty();

            let Some(new_pos) = entity.position() else {
                continue;
            };

            let position_touched = record.position().is_some();
            if local_id == Some(record.id) {
                if !position_touched {
                    continue;
                }
                match client_pos {
                    Some(client_pos) => {
                        reconciler.reconcile(entity, &mut self.grid, client_pos);
                    }
                    None => {
                        reconciler.snap_to(new_pos);
                        self.grid.insert(record.id, new_pos);
                    }
                }
            } else {
                self.grid.insert(record.id, new_pos);
                if position_touched {
                    if let Some(timestamp) = frame.meta.timestamp {
                        interpolation.add_snapshot(record.id, new_pos, timestamp);
                    }
                }
            }
        }
    }
}

fn apply_record(entity: &mut Entity, record: &EntityRecord) {
    for (name, value) in &record.scalars {
        entity.set_scalar(name, value.clone());
    }
    for patch in &record.extensions {
        match entity.extension_mut(patch.ext.kind()) {
            Some(existing) => existing.copy_fields_from(&patch.ext, patch.present),
            None => entity.add_extension(patch.ext.clone()),
        }
    }
    for kind in &record.removed_extensions {
        entity.remove_extension(*kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::InterpolationConfig;
    use crate::prediction::ReconciliationConfig;
    use glam::Vec2;
    use horde::{
        EntityKind, Extension, ExtensionKind, GameStateMeta, Message, StateEncoder, World,
    };

    fn decode_frame(buf: &[u8]) -> StateFrame {
        match horde::decode_message(buf).unwrap() {
            Message::GameState(frame) => frame,
            other => panic!("expected game state, got {other:?}"),
        }
    }

    struct Fixture {
        mirror: ClientMirror,
        reconciler: Reconciler,
        interpolation: InterpolationManager,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                mirror: ClientMirror::new(),
                reconciler: Reconciler::new(ReconciliationConfig::default()),
                interpolation: InterpolationManager::new(InterpolationConfig::default()),
            }
        }

        fn full(&mut self, frame: &StateFrame, local_id: Option<EntityId>) {
            self.mirror
                .apply_full(frame, local_id, &mut self.reconciler, &mut self.interpolation);
        }

        fn delta(&mut self, frame: &StateFrame, local_id: Option<EntityId>) {
            self.mirror
                .apply_delta(frame, local_id, &mut self.reconciler, &mut self.interpolation);
        }
    }

    #[test]
    fn full_state_replaces_the_whole_mirror() {
        let mut world = World::new();
        let zombie = world.spawn_at(EntityKind::Zombie, Vec2::new(8.0, 8.0));
        let encoder = StateEncoder::new();

        let mut fixture = Fixture::new();
        fixture.full(
            &decode_frame(&encoder.encode_full(&world, GameStateMeta::default(), &[])),
            None,
        );
        assert!(fixture.mirror.contains(zombie));

        // A later snapshot without the zombie must wipe it entirely.
        world.despawn(zombie);
        let tree = world.spawn_at(EntityKind::Tree, Vec2::new(1.0, 1.0));
        fixture.full(
            &decode_frame(&encoder.encode_full(&world, GameStateMeta::default(), &[])),
            None,
        );

        assert_eq!(fixture.mirror.len(), 1);
        assert!(fixture.mirror.contains(tree));
        assert!(!fixture.mirror.contains(zombie));
        assert!(!fixture.mirror.grid().contains(zombie));
    }

    #[test]
    fn delta_mutates_in_place_and_tracks_the_grid() {
        let mut world = World::new();
        let zombie = world.spawn_at(EntityKind::Zombie, Vec2::ZERO);
        let mut encoder = StateEncoder::new();

        let mut fixture = Fixture::new();
        fixture.full(
            &decode_frame(&encoder.encode_full(&world, GameStateMeta::default(), &[])),
            None,
        );
        encoder.encode_delta(&mut world, GameStateMeta::default());

        world
            .get_mut(zombie)
            .unwrap()
            .set_position(Vec2::new(16.0, 0.0));
        let delta = decode_frame(&encoder.encode_delta(&mut world, GameStateMeta::default()));
        fixture.delta(&delta, None);

        let mirrored = fixture.mirror.get(zombie).unwrap();
        assert!((mirrored.position().unwrap() - Vec2::new(16.0, 0.0)).length() <= 0.1);
        assert_eq!(
            fixture.mirror.grid().position(zombie).map(|p| p.x.round()),
            Some(16.0)
        );
    }

    #[test]
    fn removal_clears_mirror_and_grid() {
        let mut world = World::new();
        let zombie = world.spawn_at(EntityKind::Zombie, Vec2::ZERO);
        let mut encoder = StateEncoder::new();

        let mut fixture = Fixture::new();
        fixture.full(
            &decode_frame(&encoder.encode_full(&world, GameStateMeta::default(), &[])),
            None,
        );
        encoder.encode_delta(&mut world, GameStateMeta::default());

        world.despawn(zombie);
        let delta = decode_frame(&encoder.encode_delta(&mut world, GameStateMeta::default()));
        fixture.delta(&delta, None);

        assert!(!fixture.mirror.contains(zombie));
        assert!(!fixture.mirror.grid().contains(zombie));
    }

    #[test]
    fn unseen_entity_in_delta_is_created_via_factory() {
        let mut world = World::new();
        let mut encoder = StateEncoder::new();
        encoder.encode_delta(&mut world, GameStateMeta::default());

        let late = world.spawn_at(EntityKind::Pickup, Vec2::new(3.0, 3.0));
        let delta = decode_frame(&encoder.encode_delta(&mut world, GameStateMeta::default()));

        let mut fixture = Fixture::new();
        fixture.delta(&delta, None);

        let entity = fixture.mirror.get(late).unwrap();
        assert_eq!(entity.kind, EntityKind::Pickup);
        // Factory defaults are present even for fields the record omitted.
        assert!(entity.extension(ExtensionKind::Inventory).is_some());
    }

    #[test]
    fn extension_grant_and_revoke_propagate() {
        let mut world = World::new();
        let player = world.spawn(EntityKind::Player);
        let mut encoder = StateEncoder::new();

        let mut fixture = Fixture::new();
        fixture.full(
            &decode_frame(&encoder.encode_full(&world, GameStateMeta::default(), &[])),
            None,
        );
        encoder.encode_delta(&mut world, GameStateMeta::default());

        world
            .get_mut(player)
            .unwrap()
            .add_extension(Extension::illumination(6.0, true));
        let delta = decode_frame(&encoder.encode_delta(&mut world, GameStateMeta::default()));
        fixture.delta(&delta, None);
        assert!(
            fixture
                .mirror
                .get(player)
                .unwrap()
                .extension(ExtensionKind::Illumination)
                .is_some()
        );

        world
            .get_mut(player)
            .unwrap()
            .remove_extension(ExtensionKind::Illumination);
        let delta = decode_frame(&encoder.encode_delta(&mut world, GameStateMeta::default()));
        fixture.delta(&delta, None);
        assert!(
            fixture
                .mirror
                .get(player)
                .unwrap()
                .extension(ExtensionKind::Illumination)
                .is_none()
        );
    }

    #[test]
    fn remote_position_updates_feed_interpolation() {
        let mut world = World::new();
        let zombie = world.spawn_at(EntityKind::Zombie, Vec2::ZERO);
        let mut encoder = StateEncoder::new();

        let mut fixture = Fixture::new();
        let meta = GameStateMeta {
            timestamp: Some(0.0),
            ..Default::default()
        };
        fixture.full(&decode_frame(&encoder.encode_full(&world, meta, &[])), None);
        encoder.encode_delta(
            &mut world,
            GameStateMeta {
                timestamp: Some(0.0),
                ..Default::default()
            },
        );

        world
            .get_mut(zombie)
            .unwrap()
            .set_position(Vec2::new(10.0, 0.0));
        let delta = decode_frame(&encoder.encode_delta(
            &mut world,
            GameStateMeta {
                timestamp: Some(100.0),
                ..Default::default()
            },
        ));
        fixture.delta(&delta, None);

        assert_eq!(fixture.interpolation.snapshot_count(zombie), 2);
    }
}
