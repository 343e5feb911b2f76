mod decode;
mod encode;
mod message;
mod meta;

pub use decode::{decode_message, EntityRecord, ExtensionPatch, Message, StateFrame};
pub use encode::StateEncoder;
pub use message::{
    encode_assign_identity, encode_disconnect, encode_full_state_request, encode_hello,
    encode_map_data,
};
pub use meta::GameStateMeta;

use crate::registry::ExtensionKind;
use crate::wire::WireError;

pub const PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error("malformed json scalar: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event code {0}")]
    UnknownEvent(u8),
    #[error("unknown entity kind code {0}")]
    UnknownEntityKind(u8),
    #[error("unknown extension code {0}")]
    UnknownExtension(u8),
    #[error("unknown item code {0}")]
    UnknownItem(u8),
    #[error("unknown scalar value type {0}")]
    UnknownValueType(u32),
    #[error("extension {extension:?} has no field index {index}")]
    UnknownField { extension: ExtensionKind, index: u8 },
}
