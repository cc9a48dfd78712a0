//! # Glance Runtime 1.21
//!
//! Adapter for every 1.21 patch release, `[1.21.0, 1.22.0)`, speaking
//! protocol 767.

use glance_common::{DisplayEngine, EngineProfile, DISPLAY_LAYOUT};
use glance_core::{FactoryError, RegistryError, VersionIdentifier, VersionRange};
use tracing::debug;

pub const LABEL: &str = "paper-1.21";
pub const PROTOCOL_VERSION: i32 = 767;

pub fn range() -> Result<VersionRange, RegistryError> {
    VersionRange::half_open(VersionIdentifier::new(1, 21, 0), VersionIdentifier::new(1, 22, 0))
}

pub fn profile() -> Result<EngineProfile, FactoryError> {
    let range = range().map_err(|e| FactoryError::Initialization {
        label: LABEL.to_string(),
        reason: e.to_string(),
    })?;

    Ok(EngineProfile {
        label: LABEL,
        range,
        protocol: PROTOCOL_VERSION,
        accessors: DISPLAY_LAYOUT,
    })
}

pub fn create() -> Result<DisplayEngine, FactoryError> {
    debug!("Binding {} display engine", LABEL);
    DisplayEngine::new(profile()?)
}

glance_core::export_adapter! {
    label: LABEL,
    range: range(),
    api_version: 1,
    factory: create,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::{CapabilityFacade, Location, ModelKind, Packet, TextSpec, ViewerId};

    #[test]
    fn test_descriptor_covers_1_21_patch_releases() {
        let descriptor = descriptor().unwrap();
        for patch in [0, 1, 4, 11] {
            assert!(descriptor.range().contains(&VersionIdentifier::new(1, 21, patch)));
        }
        assert!(!descriptor.range().contains(&VersionIdentifier::new(1, 22, 0)));
        assert!(!descriptor.range().contains(&VersionIdentifier::new(1, 20, 6)));
        assert_eq!(descriptor.range().to_string(), "[1.21.0, 1.22.0)");
    }

    #[test]
    fn test_packets_carry_protocol() {
        let engine = create().unwrap();
        let id = engine
            .spawn_model(Location::new("world", 0.0, 70.0, 0.0), ModelKind::Text(TextSpec::new("Welcome")))
            .unwrap();
        engine.track(id).unwrap();
        engine.add_viewer(id, ViewerId::new()).unwrap();
        engine.render(id).unwrap();

        let packets = engine.drain_outbound();
        assert!(packets.iter().all(|p| p.protocol == PROTOCOL_VERSION));
        assert!(matches!(
            &packets[0].packet,
            Packet::Spawn { entity_type, .. } if entity_type == "minecraft:text_display"
        ));
    }
}
