pub mod entity;
pub mod net;
pub mod registry;
pub mod spatial;
pub mod wire;
pub mod world;

pub use entity::{
    factory, Entity, EntityId, Extension, ExtensionData, FieldMask, FieldValue, ItemStack,
};
pub use net::{
    decode_message, EntityRecord, ExtensionPatch, FrameError, GameStateMeta, Message,
    StateEncoder, StateFrame, PROTOCOL_VERSION,
};
pub use registry::{
    registry_hash, EntityKind, EventKind, ExtensionKind, ItemKind, RegistryError,
};
pub use spatial::SpatialGrid;
pub use wire::{ByteReader, ByteWriter, WireError};
pub use world::World;
