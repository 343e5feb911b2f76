use super::meta::GameStateMeta;
use super::FrameError;
use crate::entity::{EntityId, Extension, FieldMask, FieldValue};
use crate::registry::{EntityKind, EventKind, ExtensionKind};
use crate::wire::ByteReader;

#[derive(Debug, Clone)]
pub enum Message {
    Hello {
        protocol_version: u16,
        registry_hash: u64,
    },
    AssignIdentity {
        entity_id: EntityId,
    },
    MapData(Vec<u8>),
    GameState(StateFrame),
    FullStateRequest,
    Disconnect,
}

/// A decoded game-state frame, not yet applied to any mirror. Records that
/// failed to parse were skipped via their length prefixes and are simply
/// absent here.
#[derive(Debug, Clone)]
pub struct StateFrame {
    pub records: Vec<EntityRecord>,
    pub meta: GameStateMeta,
    pub removed_ids: Vec<EntityId>,
    pub map_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub scalars: Vec<(String, FieldValue)>,
    pub extensions: Vec<ExtensionPatch>,
    pub removed_extensions: Vec<ExtensionKind>,
}

/// One extension's decoded fields. Only the indices in `present` were on
/// the wire; the rest hold defaults and must not be applied.
#[derive(Debug, Clone)]
pub struct ExtensionPatch {
    pub ext: Extension,
    pub present: FieldMask,
}

impl ExtensionPatch {
    pub fn position(&self) -> Option<glam::Vec2> {
        if self.ext.kind() != ExtensionKind::Position
            || !self
                .present
                .contains(FieldMask::field(Extension::POSITION_POSITION))
        {
            return None;
        }
        match self.ext.data() {
            crate::entity::ExtensionData::Position(data) => Some(data.position),
            _ => None,
        }
    }
}

impl EntityRecord {
    /// The authoritative position carried by this record, if any.
    pub fn position(&self) -> Option<glam::Vec2> {
        self.extensions.iter().find_map(ExtensionPatch::position)
    }
}

pub fn decode_message(buf: &[u8]) -> Result<Message, FrameError> {
    let mut reader = ByteReader::new(buf);
    let code = reader.read_u8()?;
    let event = EventKind::from_code(code).ok_or(FrameError::UnknownEvent(code))?;

    match event {
        EventKind::Hello => Ok(Message::Hello {
            protocol_version: reader.read_u16()?,
            registry_hash: reader.read_u64()?,
        }),
        EventKind::AssignIdentity => Ok(Message::AssignIdentity {
            entity_id: reader.read_u16()?,
        }),
        EventKind::MapData => {
            let len = reader.read_u32()? as usize;
            Ok(Message::MapData(reader.read_bytes(len)?.to_vec()))
        }
        EventKind::GameState => Ok(Message::GameState(decode_state_frame(&mut reader)?)),
        EventKind::FullStateRequest => Ok(Message::FullStateRequest),
        EventKind::Disconnect => Ok(Message::Disconnect),
    }
}

fn decode_state_frame(reader: &mut ByteReader) -> Result<StateFrame, FrameError> {
    let entity_count = reader.read_u16()?;

    let mut records = Vec::with_capacity(entity_count as usize);
    for _ in 0..entity_count {
        let len = reader.read_u16()? as usize;
        // Consuming the record body up front keeps the outer cursor in
        // sync no matter how the body parse goes.
        let body = reader.read_bytes(len)?;
        match decode_entity_record(&mut ByteReader::new(body)) {
            Ok(record) => records.push(record),
            Err(err) => log::warn!("skipping unreadable entity record: {err}"),
        }
    }

    let meta = GameStateMeta::decode(reader)?;

    let removed_count = reader.read_u16()?;
    let mut removed_ids = Vec::with_capacity(removed_count as usize);
    for _ in 0..removed_count {
        removed_ids.push(reader.read_u16()?);
    }

    let map_data = if meta.is_full_state {
        let len = reader.read_u32()? as usize;
        Some(reader.read_bytes(len)?.to_vec())
    } else {
        None
    };

    Ok(StateFrame {
        records,
        meta,
        removed_ids,
        map_data,
    })
}

fn decode_entity_record(reader: &mut ByteReader) -> Result<EntityRecord, FrameError> {
    let id = reader.read_u16()?;
    let kind_code = reader.read_u8()?;
    let kind =
        EntityKind::from_code(kind_code).ok_or(FrameError::UnknownEntityKind(kind_code))?;

    let scalar_count = reader.read_u8()?;
    let mut scalars = Vec::with_capacity(scalar_count as usize);
    for _ in 0..scalar_count {
        let name = reader.read_string()?;
        let value = FieldValue::decode(reader)?;
        scalars.push((name, value));
    }

    let ext_count = reader.read_u8()?;
    let mut extensions = Vec::with_capacity(ext_count as usize);
    for _ in 0..ext_count {
        let len = reader.read_u16()? as usize;
        let body = reader.read_bytes(len)?;
        match decode_extension_record(&mut ByteReader::new(body)) {
            Ok(patch) => extensions.push(patch),
            Err(err) => log::warn!("skipping extension record on entity {id}: {err}"),
        }
    }

    let removed_count = reader.read_u8()?;
    let mut removed_extensions = Vec::with_capacity(removed_count as usize);
    for _ in 0..removed_count {
        let code = reader.read_u8()?;
        match ExtensionKind::from_code(code) {
            Some(kind) => removed_extensions.push(kind),
            None => log::warn!("entity {id} removed unknown extension code {code}"),
        }
    }

    Ok(EntityRecord {
        id,
        kind,
        scalars,
        extensions,
        removed_extensions,
    })
}

fn decode_extension_record(reader: &mut ByteReader) -> Result<ExtensionPatch, FrameError> {
    let code = reader.read_u8()?;
    let kind = ExtensionKind::from_code(code).ok_or(FrameError::UnknownExtension(code))?;

    let mut ext = Extension::default_for(kind);
    let field_count = reader.read_u8()?;
    let mut present = FieldMask::empty();
    for _ in 0..field_count {
        let index = reader.read_u8()?;
        ext.read_field(index, reader)?;
        present.insert(FieldMask::field(index));
    }
    ext.clear_dirty();

    Ok(ExtensionPatch { ext, present })
}
