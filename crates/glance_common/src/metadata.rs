//! Translation of model properties into entity data.

use crate::accessors::{
    DataAccessors, FLAG_GLOWING, FLAG_INVISIBLE, FLAG_TEXT_ALIGN_LEFT, FLAG_TEXT_ALIGN_RIGHT,
    FLAG_TEXT_DEFAULT_BACKGROUND, FLAG_TEXT_SEE_THROUGH, FLAG_TEXT_SHADOW,
};
use crate::bitmask::set_flag;
use glance_core::{DataValue, MetadataEntry, ModelKind, ModelProperties, TextAlignment, TextSpec};

/// Entity data for one model, ordered by slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMetadata {
    entries: Vec<MetadataEntry>,
}

impl EntityMetadata {
    fn push(&mut self, slot: u8, value: DataValue) {
        self.entries.push(MetadataEntry::new(slot, value));
    }

    pub fn get(&self, slot: u8) -> Option<&DataValue> {
        self.entries.iter().find(|entry| entry.slot == slot).map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<MetadataEntry> {
        self.entries
    }
}

/// Encodes [`ModelProperties`] with a version's slot layout.
#[derive(Debug, Clone, Copy)]
pub struct MetadataEncoder {
    accessors: DataAccessors,
}

impl MetadataEncoder {
    pub fn new(accessors: DataAccessors) -> Self {
        Self { accessors }
    }

    pub fn accessors(&self) -> &DataAccessors {
        &self.accessors
    }

    /// Registry key of the entity type used for `kind`
    pub fn entity_type(&self, kind: &ModelKind) -> &'static str {
        match kind {
            ModelKind::Block(_) => self.accessors.entity_types.block,
            ModelKind::Item(_) => self.accessors.entity_types.item,
            ModelKind::Text(_) => self.accessors.entity_types.text,
        }
    }

    /// Full entity data for a model.
    pub fn encode(&self, properties: &ModelProperties) -> EntityMetadata {
        let slots = &self.accessors.display;
        let mut metadata = EntityMetadata::default();

        let mut flags = set_flag(0, FLAG_INVISIBLE, properties.is_invisible());
        flags = set_flag(flags, FLAG_GLOWING, properties.is_glowing());
        metadata.push(slots.shared_flags, DataValue::Byte(flags));

        let interpolation = properties.interpolation();
        metadata.push(slots.interpolation_delay, DataValue::VarInt(interpolation.delay()));
        metadata.push(slots.transformation_duration, DataValue::VarInt(interpolation.duration()));
        metadata.push(slots.position_duration, DataValue::VarInt(interpolation.teleport()));

        let transform = properties.transform();
        metadata.push(slots.translation, DataValue::Vector3(transform.translation));
        metadata.push(slots.scale, DataValue::Vector3(transform.scale));
        metadata.push(slots.left_rotation, DataValue::Quaternion(transform.left_rotation));
        metadata.push(slots.right_rotation, DataValue::Quaternion(transform.right_rotation));

        metadata.push(slots.billboard, DataValue::Byte(properties.billboard().id()));
        metadata.push(slots.brightness, DataValue::VarInt(properties.brightness().packed()));
        metadata.push(slots.view_range, DataValue::Float(properties.view_range()));
        metadata.push(slots.shadow_radius, DataValue::Float(properties.shadow().radius()));
        metadata.push(slots.shadow_strength, DataValue::Float(properties.shadow().strength()));
        metadata.push(slots.width, DataValue::Float(properties.culling().width));
        metadata.push(slots.height, DataValue::Float(properties.culling().height));
        // -1 tells the client to use the team color
        let glow = if properties.is_glowing() {
            properties.glow_color().to_argb()
        } else {
            -1
        };
        metadata.push(slots.glow_color, DataValue::VarInt(glow));

        match properties.kind() {
            ModelKind::Block(state) => {
                metadata.push(self.accessors.block.block_state, DataValue::BlockState(state.clone()));
            }
            ModelKind::Item(item) => {
                metadata.push(self.accessors.item.item, DataValue::Item(item.clone()));
                metadata.push(self.accessors.item.display_type, DataValue::Byte(0));
            }
            ModelKind::Text(spec) => self.encode_text(spec, &mut metadata),
        }

        metadata.entries.sort_by_key(|entry| entry.slot);
        metadata
    }

    fn encode_text(&self, spec: &TextSpec, metadata: &mut EntityMetadata) {
        let slots = &self.accessors.text;

        metadata.push(slots.text, DataValue::Component(spec.text.clone()));
        metadata.push(slots.line_width, DataValue::VarInt(spec.line_width));
        let background = spec.background.map(|color| color.to_argb()).unwrap_or(0);
        metadata.push(slots.background, DataValue::VarInt(background));
        metadata.push(slots.opacity, DataValue::Byte(spec.opacity));

        let mut style = set_flag(0, FLAG_TEXT_SHADOW, spec.shadowed);
        style = set_flag(style, FLAG_TEXT_SEE_THROUGH, spec.see_through);
        style = set_flag(style, FLAG_TEXT_DEFAULT_BACKGROUND, spec.background.is_none());
        style = set_flag(style, FLAG_TEXT_ALIGN_LEFT, spec.alignment == TextAlignment::Left);
        style = set_flag(style, FLAG_TEXT_ALIGN_RIGHT, spec.alignment == TextAlignment::Right);
        metadata.push(slots.style_flags, DataValue::Byte(style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::DISPLAY_LAYOUT;
    use glance_core::{Billboard, Color};

    fn encoder() -> MetadataEncoder {
        MetadataEncoder::new(DISPLAY_LAYOUT)
    }

    #[test]
    fn test_block_model_defaults() {
        let props = ModelProperties::new(ModelKind::Block("minecraft:stone".to_string()));
        let metadata = encoder().encode(&props);

        assert_eq!(metadata.len(), 17);
        assert_eq!(metadata.get(0), Some(&DataValue::Byte(0)));
        assert_eq!(metadata.get(16), Some(&DataValue::VarInt(15 << 4 | 15 << 20)));
        assert_eq!(metadata.get(17), Some(&DataValue::Float(1.0)));
        assert_eq!(metadata.get(22), Some(&DataValue::VarInt(-1)));
        assert_eq!(
            metadata.get(23),
            Some(&DataValue::BlockState("minecraft:stone".to_string()))
        );
    }

    #[test]
    fn test_shared_flags() {
        let mut props = ModelProperties::new(ModelKind::Item("minecraft:apple".to_string()));
        props
            .set_invisible(true)
            .set_glow_color(Color::new(255, 255, 0, 0))
            .set_billboard(Billboard::Center);
        let metadata = encoder().encode(&props);

        assert_eq!(metadata.get(0), Some(&DataValue::Byte(1 << 5 | 1 << 6)));
        assert_eq!(metadata.get(15), Some(&DataValue::Byte(3)));
        assert_eq!(
            metadata.get(22),
            Some(&DataValue::VarInt(Color::new(255, 255, 0, 0).to_argb()))
        );
        assert_eq!(metadata.get(24), Some(&DataValue::Byte(0)));
    }

    #[test]
    fn test_text_style_flags() {
        let mut spec = TextSpec::new("Hello");
        spec.shadowed = true;
        spec.alignment = TextAlignment::Right;
        let metadata = encoder().encode(&ModelProperties::new(ModelKind::Text(spec)));

        assert_eq!(metadata.get(23), Some(&DataValue::Component("Hello".to_string())));
        assert_eq!(metadata.get(24), Some(&DataValue::VarInt(200)));
        assert_eq!(metadata.get(25), Some(&DataValue::VarInt(0)));
        assert_eq!(metadata.get(27), Some(&DataValue::Byte(1 | 1 << 2 | 1 << 4)));
    }

    #[test]
    fn test_entries_sorted_by_slot() {
        let props = ModelProperties::new(ModelKind::Text(TextSpec::new("x")));
        let entries = encoder().encode(&props).into_entries();
        assert!(entries.windows(2).all(|pair| pair[0].slot < pair[1].slot));
    }
}
