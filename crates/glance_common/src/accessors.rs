//! Entity-data slot layout of display entities.
//!
//! Each runtime adapter declares the layout of the host version it targets.
//! The table is checked once when the adapter is constructed, so a layout
//! that cannot be right fails the binding instead of corrupting entities.

use glance_core::FactoryError;
use serde::Serialize;
use std::collections::HashSet;

// ============================================================================
// Flags
// ============================================================================

/// Shared entity flag: invisible
pub const FLAG_INVISIBLE: u8 = 1 << 5;
/// Shared entity flag: glowing
pub const FLAG_GLOWING: u8 = 1 << 6;

pub const FLAG_TEXT_SHADOW: u8 = 1;
pub const FLAG_TEXT_SEE_THROUGH: u8 = 1 << 1;
pub const FLAG_TEXT_DEFAULT_BACKGROUND: u8 = 1 << 2;
pub const FLAG_TEXT_ALIGN_LEFT: u8 = 1 << 3;
pub const FLAG_TEXT_ALIGN_RIGHT: u8 = 1 << 4;

// ============================================================================
// Slot Tables
// ============================================================================

/// Slots shared by every display entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplaySlots {
    pub shared_flags: u8,
    pub interpolation_delay: u8,
    pub transformation_duration: u8,
    pub position_duration: u8,
    pub translation: u8,
    pub scale: u8,
    pub left_rotation: u8,
    pub right_rotation: u8,
    pub billboard: u8,
    pub brightness: u8,
    pub view_range: u8,
    pub shadow_radius: u8,
    pub shadow_strength: u8,
    pub width: u8,
    pub height: u8,
    pub glow_color: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSlots {
    pub block_state: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemSlots {
    pub item: u8,
    pub display_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextSlots {
    pub text: u8,
    pub line_width: u8,
    pub background: u8,
    pub opacity: u8,
    pub style_flags: u8,
}

/// Registry keys of the three display entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityTypes {
    pub block: &'static str,
    pub item: &'static str,
    pub text: &'static str,
}

/// Complete entity-data layout for one host version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataAccessors {
    pub display: DisplaySlots,
    pub block: BlockSlots,
    pub item: ItemSlots,
    pub text: TextSlots,
    pub entity_types: EntityTypes,
}

// ============================================================================
// Layout
// ============================================================================

/// Display entity layout from 1.20.6 through 1.21.x.
///
/// `Entity` owns slots 0-7; `Display` starts at 8 and the concrete display
/// types continue after the shared block.
pub const DISPLAY_LAYOUT: DataAccessors = DataAccessors {
    display: DisplaySlots {
        shared_flags: 0,
        interpolation_delay: 8,
        transformation_duration: 9,
        position_duration: 10,
        translation: 11,
        scale: 12,
        left_rotation: 13,
        right_rotation: 14,
        billboard: 15,
        brightness: 16,
        view_range: 17,
        shadow_radius: 18,
        shadow_strength: 19,
        width: 20,
        height: 21,
        glow_color: 22,
    },
    block: BlockSlots { block_state: 23 },
    item: ItemSlots {
        item: 23,
        display_type: 24,
    },
    text: TextSlots {
        text: 23,
        line_width: 24,
        background: 25,
        opacity: 26,
        style_flags: 27,
    },
    entity_types: EntityTypes {
        block: "minecraft:block_display",
        item: "minecraft:item_display",
        text: "minecraft:text_display",
    },
};

impl DataAccessors {
    /// Checks that no two fields of the same entity type share a slot.
    ///
    /// # Arguments
    ///
    /// * `label` - Adapter label used in the error
    pub fn validate(&self, label: &str) -> Result<(), FactoryError> {
        let d = &self.display;
        let shared = [
            d.shared_flags,
            d.interpolation_delay,
            d.transformation_duration,
            d.position_duration,
            d.translation,
            d.scale,
            d.left_rotation,
            d.right_rotation,
            d.billboard,
            d.brightness,
            d.view_range,
            d.shadow_radius,
            d.shadow_strength,
            d.width,
            d.height,
            d.glow_color,
        ];

        let kinds: [(&str, Vec<u8>); 3] = [
            ("block display", vec![self.block.block_state]),
            ("item display", vec![self.item.item, self.item.display_type]),
            (
                "text display",
                vec![
                    self.text.text,
                    self.text.line_width,
                    self.text.background,
                    self.text.opacity,
                    self.text.style_flags,
                ],
            ),
        ];

        for (kind, specific) in kinds {
            let mut seen = HashSet::new();
            for slot in shared.iter().chain(specific.iter()) {
                if !seen.insert(*slot) {
                    return Err(FactoryError::HostMismatch {
                        label: label.to_string(),
                        reason: format!("entity data slot {slot} is assigned twice for {kind}"),
                    });
                }
            }
        }

        for key in [self.entity_types.block, self.entity_types.item, self.entity_types.text] {
            if key.is_empty() {
                return Err(FactoryError::HostMismatch {
                    label: label.to_string(),
                    reason: "empty entity type key".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_layout_is_valid() {
        assert!(DISPLAY_LAYOUT.validate("test").is_ok());
    }

    #[test]
    fn test_duplicate_slot_is_host_mismatch() {
        let mut accessors = DISPLAY_LAYOUT;
        accessors.text.opacity = accessors.display.scale;

        match accessors.validate("test") {
            Err(FactoryError::HostMismatch { label, reason }) => {
                assert_eq!(label, "test");
                assert!(reason.contains("text display"));
            }
            other => panic!("expected HostMismatch, got {other:?}"),
        }
    }
}
