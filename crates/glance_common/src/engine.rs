//! Display-entity engine shared by the runtime adapters.
//!
//! An adapter supplies an [`EngineProfile`] describing its host version and
//! gets back a complete [`CapabilityFacade`]. All packets are queued on the
//! tracker and handed to the host through `drain_outbound`.

use crate::accessors::DataAccessors;
use crate::metadata::MetadataEncoder;
use crate::tracker::{ModelTracker, TrackedModel};
use glance_core::{
    CapabilityFacade, DataValue, FacadeError, FactoryError, Location, MetadataEntry, ModelError, ModelId,
    ModelKind, ModelProperties, ModelSnapshot, OutboundPacket, Packet, PropertyEditor, VersionRange, ViewerId,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace};

/// What an adapter knows about its host version
#[derive(Debug, Clone)]
pub struct EngineProfile {
    pub label: &'static str,
    pub range: VersionRange,
    pub protocol: i32,
    pub accessors: DataAccessors,
}

pub struct DisplayEngine {
    profile: EngineProfile,
    encoder: MetadataEncoder,
    tracker: ModelTracker,
    shut_down: AtomicBool,
}

impl DisplayEngine {
    /// Builds an engine, rejecting a slot layout that cannot be right.
    pub fn new(profile: EngineProfile) -> Result<Self, FactoryError> {
        profile.accessors.validate(profile.label)?;
        info!(
            "🔧 Display engine '{}' ready (protocol {}, range {})",
            profile.label, profile.protocol, profile.range
        );

        Ok(Self {
            encoder: MetadataEncoder::new(profile.accessors),
            profile,
            tracker: ModelTracker::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn profile(&self) -> &EngineProfile {
        &self.profile
    }

    pub fn tracker(&self) -> &ModelTracker {
        &self.tracker
    }

    fn packet(&self, viewer: ViewerId, packet: Packet) -> OutboundPacket {
        OutboundPacket {
            viewer,
            protocol: self.profile.protocol,
            packet,
        }
    }

    /// Spawn plus full entity data for one viewer
    fn spawn_packets(&self, model: &TrackedModel, viewer: ViewerId) -> [OutboundPacket; 2] {
        [
            self.packet(
                viewer,
                Packet::Spawn {
                    entity_id: model.entity_id,
                    model: model.id,
                    entity_type: self.encoder.entity_type(model.properties.kind()).to_string(),
                    location: model.location.clone(),
                },
            ),
            self.data_packet(model, viewer),
        ]
    }

    fn data_packet(&self, model: &TrackedModel, viewer: ViewerId) -> OutboundPacket {
        self.packet(
            viewer,
            Packet::EntityData {
                entity_id: model.entity_id,
                entries: self.encoder.encode(&model.properties).into_entries(),
            },
        )
    }

    fn remove_packet(&self, entity_id: i32, viewer: ViewerId) -> OutboundPacket {
        self.packet(
            viewer,
            Packet::Remove {
                entity_ids: vec![entity_id],
            },
        )
    }

    /// Despawns a model for everyone who currently sees it.
    fn despawn(&self, model: &mut TrackedModel) -> Vec<OutboundPacket> {
        let packets = model
            .spawned_for
            .iter()
            .map(|viewer| self.remove_packet(model.entity_id, *viewer))
            .collect();
        model.spawned_for.clear();
        model.rendered = false;
        packets
    }
}

impl CapabilityFacade for DisplayEngine {
    fn label(&self) -> &str {
        self.profile.label
    }

    fn target_range(&self) -> VersionRange {
        self.profile.range.clone()
    }

    fn protocol_version(&self) -> i32 {
        self.profile.protocol
    }

    fn spawn_model_with(
        &self,
        location: Location,
        kind: ModelKind,
        editor: PropertyEditor<'_>,
    ) -> Result<ModelId, FacadeError> {
        let mut properties = ModelProperties::new(kind);
        editor(&mut properties)?;

        let kind_name = properties.kind().name();
        let id = self.tracker.insert(location, properties);
        debug!("Spawned {} model {} on '{}'", kind_name, id, self.profile.label);
        Ok(id)
    }

    fn edit_model(&self, id: ModelId, editor: PropertyEditor<'_>) -> Result<(), FacadeError> {
        self.tracker.with_model_mut(id, |model| -> Result<(), FacadeError> {
            let mut edited = model.properties.clone();
            editor(&mut edited)?;
            // The client entity was spawned with the original type
            if !edited.kind().same_kind(model.properties.kind()) {
                return Err(ModelError::KindChange {
                    from: model.properties.kind().name(),
                    to: edited.kind().name(),
                }
                .into());
            }
            model.properties = edited;
            Ok(())
        })?
    }

    fn model(&self, id: ModelId) -> Result<ModelSnapshot, FacadeError> {
        self.tracker.with_model(id, TrackedModel::snapshot)
    }

    fn track(&self, id: ModelId) -> Result<(), FacadeError> {
        self.tracker.with_model_mut(id, |model| model.tracked = true)
    }

    fn release(&self, id: ModelId) -> Result<(), FacadeError> {
        let packets = self.tracker.with_model_mut(id, |model| {
            model.tracked = false;
            self.despawn(model)
        })?;
        self.tracker.enqueue(packets);
        Ok(())
    }

    fn is_tracked(&self, id: ModelId) -> bool {
        self.tracker.with_model(id, |model| model.tracked).unwrap_or(false)
    }

    fn tracked_count(&self) -> usize {
        self.tracker.tracked_count()
    }

    fn add_viewer(&self, id: ModelId, viewer: ViewerId) -> Result<bool, FacadeError> {
        let (added, packets) = self.tracker.with_model_mut(id, |model| {
            let added = model.viewers.insert(viewer);
            let mut packets = Vec::new();
            if added && model.tracked && model.rendered {
                packets.extend(self.spawn_packets(model, viewer));
                model.spawned_for.insert(viewer);
            }
            (added, packets)
        })?;
        self.tracker.enqueue(packets);
        Ok(added)
    }

    fn remove_viewer(&self, id: ModelId, viewer: ViewerId) -> Result<bool, FacadeError> {
        let (removed, packets) = self.tracker.with_model_mut(id, |model| {
            let removed = model.viewers.remove(&viewer);
            let mut packets = Vec::new();
            if model.spawned_for.remove(&viewer) {
                packets.push(self.remove_packet(model.entity_id, viewer));
            }
            (removed, packets)
        })?;
        self.tracker.enqueue(packets);
        Ok(removed)
    }

    fn viewers(&self, id: ModelId) -> Result<Vec<ViewerId>, FacadeError> {
        self.tracker.with_model(id, |model| model.viewers.iter().copied().collect())
    }

    fn render(&self, id: ModelId) -> Result<(), FacadeError> {
        let packets = self.tracker.with_model_mut(id, |model| {
            if !model.tracked {
                return Err(FacadeError::NotTracked(id));
            }

            let mut packets = Vec::new();
            for viewer in model.viewers.iter().copied() {
                if model.spawned_for.contains(&viewer) {
                    packets.push(self.data_packet(model, viewer));
                } else {
                    packets.extend(self.spawn_packets(model, viewer));
                }
            }
            model.spawned_for = model.viewers.clone();
            model.rendered = true;
            model.properties.clear_dirty();
            Ok(packets)
        })??;

        trace!("Rendered model {} ({} packets)", id, packets.len());
        self.tracker.enqueue(packets);
        Ok(())
    }

    fn teleport(&self, id: ModelId, location: Location, duration: i32) -> Result<(), FacadeError> {
        let slot = self.encoder.accessors().display.position_duration;
        let packets = self.tracker.with_model_mut(id, |model| {
            model.properties.set_teleport_duration(duration)?;
            model.location = location;

            let mut packets = Vec::new();
            for viewer in model.spawned_for.iter().copied() {
                packets.push(self.packet(
                    viewer,
                    Packet::EntityData {
                        entity_id: model.entity_id,
                        entries: vec![MetadataEntry::new(slot, DataValue::VarInt(duration))],
                    },
                ));
                packets.push(self.packet(
                    viewer,
                    Packet::Teleport {
                        entity_id: model.entity_id,
                        location: model.location.clone(),
                        duration,
                    },
                ));
            }
            Ok::<_, FacadeError>(packets)
        })??;

        self.tracker.enqueue(packets);
        Ok(())
    }

    fn remove(&self, id: ModelId) -> Result<(), FacadeError> {
        let mut model = self.tracker.remove(id).ok_or(FacadeError::UnknownModel(id))?;
        let packets = self.despawn(&mut model);
        self.tracker.enqueue(packets);
        debug!("Removed model {}", id);
        Ok(())
    }

    fn update_all(&self) -> usize {
        self.tracker
            .tracked_ids()
            .into_iter()
            .filter(|id| matches!(self.update_model(*id), Ok(true)))
            .count()
    }

    fn update_model(&self, id: ModelId) -> Result<bool, FacadeError> {
        let packets = self.tracker.with_model_mut(id, |model| {
            if !model.tracked {
                return Err(FacadeError::NotTracked(id));
            }
            if !model.rendered || !model.properties.is_dirty() {
                return Ok(None);
            }

            let packets: Vec<_> = model
                .spawned_for
                .iter()
                .map(|viewer| self.data_packet(model, *viewer))
                .collect();
            model.properties.clear_dirty();
            Ok(Some(packets))
        })??;

        match packets {
            Some(packets) => {
                self.tracker.enqueue(packets);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn drain_outbound(&self) -> Vec<OutboundPacket> {
        self.tracker.drain()
    }

    fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let models = self.tracker.clear();
        let mut packets = Vec::new();
        for mut model in models.iter().cloned() {
            packets.extend(self.despawn(&mut model));
        }
        info!(
            "🧹 '{}' shut down, released {} model(s), {} despawn packet(s) queued",
            self.profile.label,
            models.len(),
            packets.len()
        );
        self.tracker.enqueue(packets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::DISPLAY_LAYOUT;
    use glance_core::{Billboard, ModelError, VersionIdentifier};

    fn engine() -> DisplayEngine {
        DisplayEngine::new(EngineProfile {
            label: "test",
            range: VersionRange::exact(VersionIdentifier::new(1, 20, 6)),
            protocol: 766,
            accessors: DISPLAY_LAYOUT,
        })
        .unwrap()
    }

    fn at_origin() -> Location {
        Location::new("world", 0.0, 64.0, 0.0)
    }

    #[test]
    fn test_spawn_with_failing_editor_creates_nothing() {
        let engine = engine();
        let result = engine.spawn_model_with(
            at_origin(),
            ModelKind::Block("minecraft:stone".to_string()),
            &mut |props: &mut ModelProperties| -> Result<(), ModelError> {
                props.set_brightness(20, 0)?;
                Ok(())
            },
        );

        assert!(matches!(
            result,
            Err(FacadeError::InvalidProperty(ModelError::OutOfRange { .. }))
        ));
        assert!(engine.tracker().is_empty());
    }

    #[test]
    fn test_render_requires_tracking() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Item("minecraft:apple".to_string()))
            .unwrap();
        assert_eq!(engine.render(id), Err(FacadeError::NotTracked(id)));
    }

    #[test]
    fn test_render_sends_spawn_and_data_to_viewers() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        let viewer = ViewerId::new();
        engine.track(id).unwrap();
        assert!(engine.add_viewer(id, viewer).unwrap());
        assert!(engine.drain_outbound().is_empty(), "nothing is sent before render");

        engine.render(id).unwrap();
        let packets = engine.drain_outbound();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.viewer == viewer && p.protocol == 766));
        assert!(matches!(
            &packets[0].packet,
            Packet::Spawn { entity_type, .. } if entity_type == "minecraft:block_display"
        ));
        assert!(matches!(&packets[1].packet, Packet::EntityData { entries, .. } if entries.len() == 17));
    }

    #[test]
    fn test_late_viewer_gets_spawned() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        engine.track(id).unwrap();
        engine.render(id).unwrap();

        let late = ViewerId::new();
        engine.add_viewer(id, late).unwrap();
        let packets = engine.drain_outbound();
        assert_eq!(packets.len(), 2);
        assert!(matches!(packets[0].packet, Packet::Spawn { .. }));

        assert!(engine.remove_viewer(id, late).unwrap());
        let packets = engine.drain_outbound();
        assert!(matches!(packets[0].packet, Packet::Remove { .. }));
    }

    #[test]
    fn test_update_flushes_only_dirty_models() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        engine.track(id).unwrap();
        engine.add_viewer(id, ViewerId::new()).unwrap();
        engine.render(id).unwrap();
        engine.drain_outbound();

        assert_eq!(engine.update_all(), 0);

        engine
            .edit_model(id, &mut |props: &mut ModelProperties| -> Result<(), ModelError> {
                props.set_billboard(Billboard::Center);
                Ok(())
            })
            .unwrap();
        assert_eq!(engine.update_all(), 1);
        assert_eq!(engine.drain_outbound().len(), 1);
        assert!(!engine.update_model(id).unwrap());
    }

    #[test]
    fn test_failed_edit_leaves_model_unchanged() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        let before = engine.model(id).unwrap();

        let result = engine.edit_model(id, &mut |props: &mut ModelProperties| -> Result<(), ModelError> {
            props.set_view_range(5.0);
            props.set_shadow(65.0, 1.0)?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(engine.model(id).unwrap().properties, before.properties);
    }

    #[test]
    fn test_spawned_model_cannot_change_kind() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        engine.track(id).unwrap();
        engine.add_viewer(id, ViewerId::new()).unwrap();
        engine.render(id).unwrap();
        engine.drain_outbound();

        let swapped = engine.edit_model(id, &mut |props: &mut ModelProperties| -> Result<(), ModelError> {
            *props = ModelProperties::new(ModelKind::Text(glance_core::TextSpec::new("hi")));
            Ok(())
        });
        assert_eq!(
            swapped,
            Err(FacadeError::InvalidProperty(ModelError::KindChange {
                from: "block",
                to: "text"
            }))
        );
        assert_eq!(engine.update_all(), 0);
        assert!(engine.drain_outbound().is_empty());

        // Same-kind content changes go out as entity data
        engine
            .edit_model(id, &mut |props: &mut ModelProperties| -> Result<(), ModelError> {
                props.set_content(ModelKind::Block("minecraft:dirt".to_string()))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(engine.update_all(), 1);
        let packets = engine.drain_outbound();
        assert!(matches!(
            &packets[0].packet,
            Packet::EntityData { entries, .. }
                if entries.iter().any(|e| e.value == DataValue::BlockState("minecraft:dirt".to_string()))
        ));
    }

    #[test]
    fn test_teleport_validates_duration() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Text(glance_core::TextSpec::new("hi")))
            .unwrap();

        assert!(engine
            .teleport(id, Location::new("world", 5.0, 64.0, 5.0), 60)
            .is_err());
        engine
            .teleport(id, Location::new("world", 5.0, 64.0, 5.0), 10)
            .unwrap();
        let snapshot = engine.model(id).unwrap();
        assert_eq!(snapshot.location.x, 5.0);
        assert_eq!(snapshot.properties.interpolation().teleport(), 10);
    }

    #[test]
    fn test_release_and_remove_despawn() {
        let engine = engine();
        let id = engine
            .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
            .unwrap();
        engine.track(id).unwrap();
        engine.add_viewer(id, ViewerId::new()).unwrap();
        engine.render(id).unwrap();
        engine.drain_outbound();

        engine.release(id).unwrap();
        assert!(!engine.is_tracked(id));
        assert!(matches!(engine.drain_outbound()[0].packet, Packet::Remove { .. }));

        engine.remove(id).unwrap();
        assert_eq!(engine.remove(id), Err(FacadeError::UnknownModel(id)));
        assert!(engine.model(id).is_err());
    }

    #[test]
    fn test_shutdown_despawns_everything_once() {
        let engine = engine();
        for _ in 0..3 {
            let id = engine
                .spawn_model(at_origin(), ModelKind::Block("minecraft:stone".to_string()))
                .unwrap();
            engine.track(id).unwrap();
            engine.add_viewer(id, ViewerId::new()).unwrap();
            engine.render(id).unwrap();
        }
        engine.drain_outbound();

        engine.shutdown();
        engine.shutdown();
        assert_eq!(engine.drain_outbound().len(), 3);
        assert_eq!(engine.tracked_count(), 0);
    }
}
