use glam::Vec2;

use super::{Entity, EntityId, Extension};
use crate::registry::EntityKind;

/// Builds an entity with the default capability set for its kind. Server
/// spawning and client-side decoding of unseen entities go through the
/// same table so both ends agree on what a freshly created entity carries.
pub fn spawn(id: EntityId, kind: EntityKind) -> Entity {
    let mut entity = Entity::new(id, kind);
    for ext in default_extensions(kind) {
        entity.add_extension(ext);
    }
    entity
}

pub fn default_extensions(kind: EntityKind) -> Vec<Extension> {
    match kind {
        EntityKind::Player => vec![
            Extension::position(Vec2::ZERO, Vec2::new(0.8, 0.8)),
            Extension::motion(Vec2::ZERO),
            Extension::health(100.0, 100.0),
            Extension::inventory(Vec::new()),
        ],
        EntityKind::Zombie => vec![
            Extension::position(Vec2::ZERO, Vec2::new(0.9, 0.9)),
            Extension::motion(Vec2::ZERO),
            Extension::health(40.0, 40.0),
        ],
        EntityKind::Projectile => vec![
            Extension::position(Vec2::ZERO, Vec2::new(0.2, 0.2)),
            Extension::motion(Vec2::ZERO),
        ],
        EntityKind::Tree => vec![
            Extension::position(Vec2::ZERO, Vec2::new(1.5, 1.5)),
            Extension::health(200.0, 200.0),
        ],
        EntityKind::Wall => vec![
            Extension::position(Vec2::ZERO, Vec2::ONE),
            Extension::health(300.0, 300.0),
        ],
        EntityKind::Pickup => vec![
            Extension::position(Vec2::ZERO, Vec2::new(0.5, 0.5)),
            Extension::inventory(Vec::new()),
        ],
    }
}
