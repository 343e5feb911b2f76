use bitflags::bitflags;
use glam::Vec2;

use crate::net::FrameError;
use crate::registry::{ExtensionKind, ItemKind};
use crate::wire::{ByteReader, ByteWriter};

bitflags! {
    /// Dirty bits over an extension's field indices. No extension carries
    /// more than 8 fields.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldMask: u8 {
        const FIELD_0 = 1;
        const FIELD_1 = 1 << 1;
        const FIELD_2 = 1 << 2;
        const FIELD_3 = 1 << 3;
        const FIELD_4 = 1 << 4;
        const FIELD_5 = 1 << 5;
        const FIELD_6 = 1 << 6;
        const FIELD_7 = 1 << 7;
    }
}

impl FieldMask {
    pub fn field(index: u8) -> Self {
        FieldMask::from_bits_truncate(1u8 << index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionData {
    pub position: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionData {
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthData {
    pub current: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStack {
    pub kind: ItemKind,
    pub count: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryData {
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IlluminationData {
    pub radius: f64,
    pub lit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionData {
    Position(PositionData),
    Motion(MotionData),
    Health(HealthData),
    Inventory(InventoryData),
    Illumination(IlluminationData),
}

/// One capability of an entity. Field indices, not names, travel on the
/// wire; the value layout of each index is fixed by the extension kind.
/// Every instance tracks which of its own fields changed since the last
/// dirty-only flush.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    data: ExtensionData,
    dirty: FieldMask,
}

impl Extension {
    pub const POSITION_POSITION: u8 = 0;
    pub const POSITION_SIZE: u8 = 1;
    pub const MOTION_VELOCITY: u8 = 0;
    pub const HEALTH_CURRENT: u8 = 0;
    pub const HEALTH_MAX: u8 = 1;
    pub const INVENTORY_ITEMS: u8 = 0;
    pub const ILLUMINATION_RADIUS: u8 = 0;
    pub const ILLUMINATION_LIT: u8 = 1;

    pub fn position(position: Vec2, size: Vec2) -> Self {
        Self::from_data(ExtensionData::Position(PositionData { position, size }))
    }

    pub fn motion(velocity: Vec2) -> Self {
        Self::from_data(ExtensionData::Motion(MotionData { velocity }))
    }

    pub fn health(current: f64, max: f64) -> Self {
        Self::from_data(ExtensionData::Health(HealthData { current, max }))
    }

    pub fn inventory(items: Vec<ItemStack>) -> Self {
        Self::from_data(ExtensionData::Inventory(InventoryData { items }))
    }

    pub fn illumination(radius: f64, lit: bool) -> Self {
        Self::from_data(ExtensionData::Illumination(IlluminationData {
            radius,
            lit,
        }))
    }

    pub fn default_for(kind: ExtensionKind) -> Self {
        let data = match kind {
            ExtensionKind::Position => ExtensionData::Position(PositionData::default()),
            ExtensionKind::Motion => ExtensionData::Motion(MotionData::default()),
            ExtensionKind::Health => ExtensionData::Health(HealthData::default()),
            ExtensionKind::Inventory => ExtensionData::Inventory(InventoryData::default()),
            ExtensionKind::Illumination => {
                ExtensionData::Illumination(IlluminationData::default())
            }
        };
        Self::from_data(data)
    }

    fn from_data(data: ExtensionData) -> Self {
        let mut ext = Self {
            data,
            dirty: FieldMask::empty(),
        };
        ext.mark_all_dirty();
        ext
    }

    pub fn kind(&self) -> ExtensionKind {
        match self.data {
            ExtensionData::Position(_) => ExtensionKind::Position,
            ExtensionData::Motion(_) => ExtensionKind::Motion,
            ExtensionData::Health(_) => ExtensionKind::Health,
            ExtensionData::Inventory(_) => ExtensionKind::Inventory,
            ExtensionData::Illumination(_) => ExtensionKind::Illumination,
        }
    }

    pub fn field_count(&self) -> u8 {
        match self.data {
            ExtensionData::Position(_) => 2,
            ExtensionData::Motion(_) => 1,
            ExtensionData::Health(_) => 2,
            ExtensionData::Inventory(_) => 1,
            ExtensionData::Illumination(_) => 2,
        }
    }

    pub fn data(&self) -> &ExtensionData {
        &self.data
    }

    pub fn dirty(&self) -> FieldMask {
        self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = FieldMask::empty();
    }

    pub fn mark_all_dirty(&mut self) {
        self.dirty = self.all_fields();
    }

    pub fn all_fields(&self) -> FieldMask {
        FieldMask::from_bits_truncate((1u16 << self.field_count()).wrapping_sub(1) as u8)
    }

    pub fn set_position(&mut self, position: Vec2) {
        if let ExtensionData::Position(data) = &mut self.data {
            data.position = position;
            self.dirty.insert(FieldMask::field(Self::POSITION_POSITION));
        }
    }

    pub fn set_size(&mut self, size: Vec2) {
        if let ExtensionData::Position(data) = &mut self.data {
            data.size = size;
            self.dirty.insert(FieldMask::field(Self::POSITION_SIZE));
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        if let ExtensionData::Motion(data) = &mut self.data {
            data.velocity = velocity;
            self.dirty.insert(FieldMask::field(Self::MOTION_VELOCITY));
        }
    }

    pub fn set_health(&mut self, current: f64) {
        if let ExtensionData::Health(data) = &mut self.data {
            data.current = current;
            self.dirty.insert(FieldMask::field(Self::HEALTH_CURRENT));
        }
    }

    pub fn set_max_health(&mut self, max: f64) {
        if let ExtensionData::Health(data) = &mut self.data {
            data.max = max;
            self.dirty.insert(FieldMask::field(Self::HEALTH_MAX));
        }
    }

    pub fn set_items(&mut self, items: Vec<ItemStack>) {
        if let ExtensionData::Inventory(data) = &mut self.data {
            data.items = items;
            self.dirty.insert(FieldMask::field(Self::INVENTORY_ITEMS));
        }
    }

    pub fn set_radius(&mut self, radius: f64) {
        if let ExtensionData::Illumination(data) = &mut self.data {
            data.radius = radius;
            self.dirty.insert(FieldMask::field(Self::ILLUMINATION_RADIUS));
        }
    }

    pub fn set_lit(&mut self, lit: bool) {
        if let ExtensionData::Illumination(data) = &mut self.data {
            data.lit = lit;
            self.dirty.insert(FieldMask::field(Self::ILLUMINATION_LIT));
        }
    }

    /// Writes the value of one field index. The layout is implied by
    /// (kind, index) on both ends.
    pub fn write_field(&self, index: u8, writer: &mut ByteWriter) -> Result<(), FrameError> {
        match (&self.data, index) {
            (ExtensionData::Position(data), Self::POSITION_POSITION) => {
                writer.write_position2(data.position);
            }
            (ExtensionData::Position(data), Self::POSITION_SIZE) => {
                writer.write_position2(data.size);
            }
            (ExtensionData::Motion(data), Self::MOTION_VELOCITY) => {
                writer.write_velocity2(data.velocity);
            }
            (ExtensionData::Health(data), Self::HEALTH_CURRENT) => {
                writer.write_f64(data.current);
            }
            (ExtensionData::Health(data), Self::HEALTH_MAX) => {
                writer.write_f64(data.max);
            }
            (ExtensionData::Inventory(data), Self::INVENTORY_ITEMS) => {
                writer.write_u8(data.items.len().min(u8::MAX as usize) as u8);
                for stack in data.items.iter().take(u8::MAX as usize) {
                    writer.write_u8(stack.kind.code());
                    writer.write_u16(stack.count);
                }
            }
            (ExtensionData::Illumination(data), Self::ILLUMINATION_RADIUS) => {
                writer.write_f64(data.radius);
            }
            (ExtensionData::Illumination(data), Self::ILLUMINATION_LIT) => {
                writer.write_bool(data.lit);
            }
            _ => {
                return Err(FrameError::UnknownField {
                    extension: self.kind(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Reads one field value in place without touching the dirty mask;
    /// decoding is not a local mutation.
    pub fn read_field(&mut self, index: u8, reader: &mut ByteReader) -> Result<(), FrameError> {
        match (&mut self.data, index) {
            (ExtensionData::Position(data), Self::POSITION_POSITION) => {
                data.position = reader.read_position2()?;
            }
            (ExtensionData::Position(data), Self::POSITION_SIZE) => {
                data.size = reader.read_position2()?;
            }
            (ExtensionData::Motion(data), Self::MOTION_VELOCITY) => {
                data.velocity = reader.read_velocity2()?;
            }
            (ExtensionData::Health(data), Self::HEALTH_CURRENT) => {
                data.current = reader.read_f64()?;
            }
            (ExtensionData::Health(data), Self::HEALTH_MAX) => {
                data.max = reader.read_f64()?;
            }
            (ExtensionData::Inventory(data), Self::INVENTORY_ITEMS) => {
                let count = reader.read_u8()? as usize;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let code = reader.read_u8()?;
                    let kind =
                        ItemKind::from_code(code).ok_or(FrameError::UnknownItem(code))?;
                    let count = reader.read_u16()?;
                    items.push(ItemStack { kind, count });
                }
                data.items = items;
            }
            (ExtensionData::Illumination(data), Self::ILLUMINATION_RADIUS) => {
                data.radius = reader.read_f64()?;
            }
            (ExtensionData::Illumination(data), Self::ILLUMINATION_LIT) => {
                data.lit = reader.read_bool()?;
            }
            _ => {
                return Err(FrameError::UnknownField {
                    extension: self.kind(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Copies the masked fields of `other` into this extension. Kinds must
    /// match; the dirty mask is untouched.
    pub fn copy_fields_from(&mut self, other: &Extension, mask: FieldMask) {
        match (&mut self.data, &other.data) {
            (ExtensionData::Position(dst), ExtensionData::Position(src)) => {
                if mask.contains(FieldMask::field(Self::POSITION_POSITION)) {
                    dst.position = src.position;
                }
                if mask.contains(FieldMask::field(Self::POSITION_SIZE)) {
                    dst.size = src.size;
                }
            }
            (ExtensionData::Motion(dst), ExtensionData::Motion(src)) => {
                if mask.contains(FieldMask::field(Self::MOTION_VELOCITY)) {
                    dst.velocity = src.velocity;
                }
            }
            (ExtensionData::Health(dst), ExtensionData::Health(src)) => {
                if mask.contains(FieldMask::field(Self::HEALTH_CURRENT)) {
                    dst.current = src.current;
                }
                if mask.contains(FieldMask::field(Self::HEALTH_MAX)) {
                    dst.max = src.max;
                }
            }
            (ExtensionData::Inventory(dst), ExtensionData::Inventory(src)) => {
                if mask.contains(FieldMask::field(Self::INVENTORY_ITEMS)) {
                    dst.items = src.items.clone();
                }
            }
            (ExtensionData::Illumination(dst), ExtensionData::Illumination(src)) => {
                if mask.contains(FieldMask::field(Self::ILLUMINATION_RADIUS)) {
                    dst.radius = src.radius;
                }
                if mask.contains(FieldMask::field(Self::ILLUMINATION_LIT)) {
                    dst.lit = src.lit;
                }
            }
            _ => {}
        }
    }
}
