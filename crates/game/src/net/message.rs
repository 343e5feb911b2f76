use super::PROTOCOL_VERSION;
use crate::entity::EntityId;
use crate::registry::{registry_hash, EventKind};
use crate::wire::ByteWriter;

/// Connect-time compatibility check: protocol version plus the registry
/// hash. Both ends must agree before any state frame is interpreted.
pub fn encode_hello() -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u8(EventKind::Hello.code());
    writer.write_u16(PROTOCOL_VERSION);
    writer.write_u64(registry_hash());
    writer.into_vec()
}

pub fn encode_assign_identity(entity_id: EntityId) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u8(EventKind::AssignIdentity.code());
    writer.write_u16(entity_id);
    writer.into_vec()
}

pub fn encode_map_data(data: &[u8]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u8(EventKind::MapData.code());
    writer.write_u32(data.len() as u32);
    writer.write_bytes(data);
    writer.into_vec()
}

pub fn encode_full_state_request() -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u8(EventKind::FullStateRequest.code());
    writer.into_vec()
}

pub fn encode_disconnect() -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_u8(EventKind::Disconnect.code());
    writer.into_vec()
}
