//! Concurrent model store with viewer sets and an outbound packet queue.

use dashmap::DashMap;
use glance_core::{FacadeError, Location, ModelId, ModelProperties, ModelSnapshot, OutboundPacket, ViewerId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

/// First entity id handed out; keeps clear of ids the host assigns itself.
pub const ENTITY_ID_BASE: i32 = 0x4000_0000;

/// Server-side state of one model
#[derive(Debug, Clone)]
pub struct TrackedModel {
    pub id: ModelId,
    pub entity_id: i32,
    pub location: Location,
    pub properties: ModelProperties,
    pub tracked: bool,
    /// Whether `render` has sent the model to its viewers
    pub rendered: bool,
    pub viewers: BTreeSet<ViewerId>,
    /// Viewers whose client currently has the entity spawned
    pub spawned_for: BTreeSet<ViewerId>,
}

impl TrackedModel {
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            id: self.id,
            entity_id: self.entity_id,
            location: self.location.clone(),
            properties: self.properties.clone(),
            tracked: self.tracked,
            viewers: self.viewers.iter().copied().collect(),
        }
    }
}

pub struct ModelTracker {
    models: DashMap<ModelId, TrackedModel>,
    next_entity_id: AtomicI32,
    outbound: Mutex<Vec<OutboundPacket>>,
}

impl ModelTracker {
    pub fn new() -> Self {
        Self {
            models: DashMap::new(),
            next_entity_id: AtomicI32::new(ENTITY_ID_BASE),
            outbound: Mutex::new(Vec::new()),
        }
    }

    /// Stores a new, untracked model without viewers.
    pub fn insert(&self, location: Location, properties: ModelProperties) -> ModelId {
        let id = ModelId::new();
        let entity_id = self.next_entity_id.fetch_add(1, Ordering::Relaxed);
        self.models.insert(
            id,
            TrackedModel {
                id,
                entity_id,
                location,
                properties,
                tracked: false,
                rendered: false,
                viewers: BTreeSet::new(),
                spawned_for: BTreeSet::new(),
            },
        );
        id
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.models.contains_key(&id)
    }

    /// Runs `f` on a model, failing with `UnknownModel` if it does not exist.
    pub fn with_model<R>(&self, id: ModelId, f: impl FnOnce(&TrackedModel) -> R) -> Result<R, FacadeError> {
        let model = self.models.get(&id).ok_or(FacadeError::UnknownModel(id))?;
        Ok(f(&model))
    }

    /// Mutable variant of [`ModelTracker::with_model`]. Do not touch the
    /// tracker from inside `f`.
    pub fn with_model_mut<R>(
        &self,
        id: ModelId,
        f: impl FnOnce(&mut TrackedModel) -> R,
    ) -> Result<R, FacadeError> {
        let mut model = self.models.get_mut(&id).ok_or(FacadeError::UnknownModel(id))?;
        Ok(f(&mut model))
    }

    pub fn remove(&self, id: ModelId) -> Option<TrackedModel> {
        self.models.remove(&id).map(|(_, model)| model)
    }

    /// Removes every model, returning them.
    pub fn clear(&self) -> Vec<TrackedModel> {
        let ids: Vec<ModelId> = self.models.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    pub fn tracked_ids(&self) -> Vec<ModelId> {
        self.models
            .iter()
            .filter(|entry| entry.tracked)
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn tracked_count(&self) -> usize {
        self.models.iter().filter(|entry| entry.tracked).count()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn enqueue(&self, packets: impl IntoIterator<Item = OutboundPacket>) {
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(packets);
    }

    /// Takes every queued packet, oldest first.
    pub fn drain(&self) -> Vec<OutboundPacket> {
        std::mem::take(&mut *self.outbound.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn pending(&self) -> usize {
        self.outbound.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ModelTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::{ModelKind, Packet};

    fn stone() -> ModelProperties {
        ModelProperties::new(ModelKind::Block("minecraft:stone".to_string()))
    }

    #[test]
    fn test_insert_assigns_distinct_entity_ids() {
        let tracker = ModelTracker::new();
        let a = tracker.insert(Location::new("world", 0.0, 64.0, 0.0), stone());
        let b = tracker.insert(Location::new("world", 1.0, 64.0, 0.0), stone());

        let a_entity = tracker.with_model(a, |m| m.entity_id).unwrap();
        let b_entity = tracker.with_model(b, |m| m.entity_id).unwrap();
        assert_eq!(a_entity, ENTITY_ID_BASE);
        assert_eq!(b_entity, ENTITY_ID_BASE + 1);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_unknown_model() {
        let tracker = ModelTracker::new();
        let id = ModelId::new();
        assert_eq!(tracker.with_model(id, |_| ()), Err(FacadeError::UnknownModel(id)));
    }

    #[test]
    fn test_tracked_ids() {
        let tracker = ModelTracker::new();
        let a = tracker.insert(Location::new("world", 0.0, 0.0, 0.0), stone());
        let _b = tracker.insert(Location::new("world", 0.0, 0.0, 0.0), stone());
        tracker.with_model_mut(a, |m| m.tracked = true).unwrap();

        assert_eq!(tracker.tracked_ids(), vec![a]);
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn test_outbound_queue_drains_in_order() {
        let tracker = ModelTracker::new();
        let viewer = ViewerId::new();
        tracker.enqueue((1..=3).map(|id| OutboundPacket {
            viewer,
            protocol: 766,
            packet: Packet::Remove { entity_ids: vec![id] },
        }));

        assert_eq!(tracker.pending(), 3);
        let drained = tracker.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0].packet, Packet::Remove { entity_ids: vec![1] });
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_clear_returns_everything() {
        let tracker = ModelTracker::new();
        tracker.insert(Location::new("world", 0.0, 0.0, 0.0), stone());
        tracker.insert(Location::new("world", 0.0, 0.0, 0.0), stone());
        assert_eq!(tracker.clear().len(), 2);
        assert!(tracker.is_empty());
    }
}
