mod extension;
pub mod factory;
mod value;

pub use extension::{
    Extension, ExtensionData, FieldMask, HealthData, IlluminationData, InventoryData, ItemStack,
    MotionData, PositionData,
};
pub use value::FieldValue;

use std::collections::BTreeMap;

use glam::Vec2;

use crate::registry::{EntityKind, ExtensionKind};

pub type EntityId = u16;

#[derive(Debug, Clone)]
struct ScalarField {
    value: FieldValue,
    dirty: bool,
}

/// An identity plus an ordered set of capability extensions. The extension
/// set is seeded at construction from the entity's kind but gameplay code
/// may grant or revoke capabilities later; both are observable to the
/// serializer as distinct wire events, not just field changes.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    extensions: Vec<Extension>,
    scalars: BTreeMap<String, ScalarField>,
    removed_extensions: Vec<ExtensionKind>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            extensions: Vec::new(),
            scalars: BTreeMap::new(),
            removed_extensions: Vec::new(),
        }
    }

    /// Adds (or replaces) a capability. The extension arrives fully dirty
    /// so the next dirty-only flush transmits every field.
    pub fn add_extension(&mut self, mut ext: Extension) {
        ext.mark_all_dirty();
        self.removed_extensions.retain(|kind| *kind != ext.kind());
        if let Some(existing) = self
            .extensions
            .iter_mut()
            .find(|existing| existing.kind() == ext.kind())
        {
            *existing = ext;
        } else {
            self.extensions.push(ext);
        }
    }

    /// Revokes a capability; the removal is queued for the next flush.
    pub fn remove_extension(&mut self, kind: ExtensionKind) -> Option<Extension> {
        let index = self
            .extensions
            .iter()
            .position(|ext| ext.kind() == kind)?;
        let ext = self.extensions.remove(index);
        if !self.removed_extensions.contains(&kind) {
            self.removed_extensions.push(kind);
        }
        Some(ext)
    }

    pub fn extension(&self, kind: ExtensionKind) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.kind() == kind)
    }

    pub fn extension_mut(&mut self, kind: ExtensionKind) -> Option<&mut Extension> {
        self.extensions.iter_mut().find(|ext| ext.kind() == kind)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.iter()
    }

    pub fn extensions_mut(&mut self) -> impl Iterator<Item = &mut Extension> {
        self.extensions.iter_mut()
    }

    pub fn removed_extensions(&self) -> &[ExtensionKind] {
        &self.removed_extensions
    }

    pub fn set_scalar(&mut self, name: &str, value: FieldValue) {
        match self.scalars.get_mut(name) {
            Some(field) => {
                field.value = value;
                field.dirty = true;
            }
            None => {
                self.scalars
                    .insert(name.to_string(), ScalarField { value, dirty: true });
            }
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&FieldValue> {
        self.scalars.get(name).map(|field| &field.value)
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.scalars
            .iter()
            .map(|(name, field)| (name.as_str(), &field.value))
    }

    pub fn dirty_scalars(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.scalars
            .iter()
            .filter(|(_, field)| field.dirty)
            .map(|(name, field)| (name.as_str(), &field.value))
    }

    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    /// True when a dirty-only flush would emit anything for this entity.
    pub fn is_dirty(&self) -> bool {
        !self.removed_extensions.is_empty()
            || self.extensions.iter().any(Extension::is_dirty)
            || self.scalars.values().any(|field| field.dirty)
    }

    /// Called by the serializer after it consumed this entity's changes.
    pub fn clear_dirty(&mut self) {
        for ext in &mut self.extensions {
            ext.clear_dirty();
        }
        for field in self.scalars.values_mut() {
            field.dirty = false;
        }
        self.removed_extensions.clear();
    }

    pub fn position(&self) -> Option<Vec2> {
        match self.extension(ExtensionKind::Position)?.data() {
            ExtensionData::Position(data) => Some(data.position),
            _ => None,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        if let Some(ext) = self.extension_mut(ExtensionKind::Position) {
            ext.set_position(position);
        }
    }

    pub fn velocity(&self) -> Option<Vec2> {
        match self.extension(ExtensionKind::Motion)?.data() {
            ExtensionData::Motion(data) => Some(data.velocity),
            _ => None,
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        if let Some(ext) = self.extension_mut(ExtensionKind::Motion) {
            ext.set_velocity(velocity);
        }
    }
}
