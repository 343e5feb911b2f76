use std::collections::HashSet;

use super::meta::GameStateMeta;
use super::FrameError;
use crate::entity::{Entity, EntityId, Extension, FieldMask, FieldValue};
use crate::registry::EventKind;
use crate::wire::ByteWriter;
use crate::world::World;

/// Walks the live entity set and emits game-state frames. Holds the id set
/// of the previous flush so removals are observed as a diff at flush time.
///
/// Delta flushes consume dirty state: the bits of every field and every
/// extension that actually made it into the buffer are cleared, and the
/// removal diff is advanced. Full-state flushes are snapshot views and
/// leave the incremental tracking untouched, so one can be produced for a
/// joining client at any point without disturbing the delta stream.
#[derive(Debug, Default)]
pub struct StateEncoder {
    previous_ids: HashSet<EntityId>,
}

impl StateEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode_delta(&mut self, world: &mut World, mut meta: GameStateMeta) -> Vec<u8> {
        meta.is_full_state = false;

        let mut writer = ByteWriter::new();
        writer.write_u8(EventKind::GameState.code());

        let count_at = writer.reserve_u16();
        let mut emitted: u16 = 0;
        for id in world.sorted_ids() {
            let Some(entity) = world.get_mut(id) else {
                continue;
            };
            if !entity.is_dirty() {
                continue;
            }
            let rollback = writer.len();
            match write_entity_record(&mut writer, entity, true) {
                Ok(()) => {
                    entity.clear_dirty();
                    emitted += 1;
                }
                Err(err) => {
                    log::error!("dropping entity {id} from delta flush: {err}");
                    writer.truncate(rollback);
                }
            }
        }
        writer.patch_u16(count_at, emitted);

        meta.encode(&mut writer);

        let current: HashSet<EntityId> = world.entities().map(|entity| entity.id).collect();
        let removed = removed_ids(&self.previous_ids, &current);
        writer.write_u16(removed.len() as u16);
        for id in &removed {
            writer.write_u16(*id);
        }
        self.previous_ids = current;

        writer.into_vec()
    }

    pub fn encode_full(
        &self,
        world: &World,
        mut meta: GameStateMeta,
        map_data: &[u8],
    ) -> Vec<u8> {
        meta.is_full_state = true;

        let mut writer = ByteWriter::new();
        writer.write_u8(EventKind::GameState.code());

        let count_at = writer.reserve_u16();
        let mut emitted: u16 = 0;
        for id in world.sorted_ids() {
            let Some(entity) = world.get(id) else {
                continue;
            };
            let rollback = writer.len();
            match write_entity_record(&mut writer, entity, false) {
                Ok(()) => emitted += 1,
                Err(err) => {
                    log::error!("dropping entity {id} from full flush: {err}");
                    writer.truncate(rollback);
                }
            }
        }
        writer.patch_u16(count_at, emitted);

        meta.encode(&mut writer);

        // The removal diff is reported but not consumed; the next delta
        // still carries it for clients that skipped this snapshot.
        let current: HashSet<EntityId> = world.entities().map(|entity| entity.id).collect();
        let removed = removed_ids(&self.previous_ids, &current);
        writer.write_u16(removed.len() as u16);
        for id in &removed {
            writer.write_u16(*id);
        }

        writer.write_u32(map_data.len() as u32);
        writer.write_bytes(map_data);

        writer.into_vec()
    }
}

fn removed_ids(previous: &HashSet<EntityId>, current: &HashSet<EntityId>) -> Vec<EntityId> {
    let mut removed: Vec<EntityId> = previous.difference(current).copied().collect();
    removed.sort_unstable();
    removed
}

fn write_entity_record(
    writer: &mut ByteWriter,
    entity: &Entity,
    only_dirty: bool,
) -> Result<(), FrameError> {
    let len_at = writer.reserve_u16();
    let start = writer.len();

    writer.write_u16(entity.id);
    writer.write_u8(entity.kind.code());

    let scalars: Vec<(&str, &FieldValue)> = if only_dirty {
        entity.dirty_scalars().collect()
    } else {
        entity.scalars().collect()
    };
    writer.write_u8(scalars.len().min(u8::MAX as usize) as u8);
    for (name, value) in scalars.iter().take(u8::MAX as usize) {
        writer.write_string(name);
        value.encode(writer);
    }

    let ext_count_at = writer.reserve_u8();
    let mut ext_count: u8 = 0;
    for ext in entity.extensions() {
        let mask = if only_dirty { ext.dirty() } else { ext.all_fields() };
        if mask.is_empty() {
            continue;
        }
        write_extension_record(writer, ext, mask)?;
        ext_count += 1;
    }
    writer.patch_u8(ext_count_at, ext_count);

    let removed: &[_] = if only_dirty {
        entity.removed_extensions()
    } else {
        &[]
    };
    writer.write_u8(removed.len() as u8);
    for kind in removed {
        writer.write_u8(kind.code());
    }

    writer.patch_u16(len_at, (writer.len() - start) as u16);
    Ok(())
}

fn write_extension_record(
    writer: &mut ByteWriter,
    ext: &Extension,
    mask: FieldMask,
) -> Result<(), FrameError> {
    let len_at = writer.reserve_u16();
    let start = writer.len();

    writer.write_u8(ext.kind().code());

    let indices: Vec<u8> = (0..ext.field_count())
        .filter(|index| mask.contains(FieldMask::field(*index)))
        .collect();
    writer.write_u8(indices.len() as u8);
    for index in indices {
        writer.write_u8(index);
        ext.write_field(index, writer)?;
    }

    writer.patch_u16(len_at, (writer.len() - start) as u16);
    Ok(())
}
