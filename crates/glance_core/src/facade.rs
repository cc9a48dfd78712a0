//! The version-independent capability surface.
//!
//! Gameplay code only ever talks to a [`CapabilityFacade`]. Each bundled
//! adapter provides one implementation for the host versions it was built
//! against, and the loader publishes exactly one of them.

use crate::error::{FacadeError, ModelError};
use crate::model::{Location, ModelId, ModelKind, ModelProperties, Quaternion, Vector3, ViewerId};
use crate::version::VersionRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editor callback applied to a model's properties.
///
/// The facade is used as a trait object, so editors are passed as
/// `&mut dyn FnMut` rather than generics.
pub type PropertyEditor<'a> = &'a mut dyn FnMut(&mut ModelProperties) -> Result<(), ModelError>;

// ============================================================================
// Capabilities
// ============================================================================

/// Named groups of facade operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Describe,
    Spawn,
    Edit,
    Track,
    Viewers,
    Render,
    Update,
    Outbound,
    Lifecycle,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Describe,
        Capability::Spawn,
        Capability::Edit,
        Capability::Track,
        Capability::Viewers,
        Capability::Render,
        Capability::Update,
        Capability::Outbound,
        Capability::Lifecycle,
    ];

    /// Affinity used unless an adapter overrides [`CapabilityFacade::affinity`].
    pub fn default_affinity(&self) -> ThreadAffinity {
        match self {
            Capability::Describe
            | Capability::Spawn
            | Capability::Edit
            | Capability::Track
            | Capability::Viewers => ThreadAffinity::Any,
            Capability::Render | Capability::Update | Capability::Outbound | Capability::Lifecycle => {
                ThreadAffinity::MainThread
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Describe => "describe",
            Capability::Spawn => "spawn",
            Capability::Edit => "edit",
            Capability::Track => "track",
            Capability::Viewers => "viewers",
            Capability::Render => "render",
            Capability::Update => "update",
            Capability::Outbound => "outbound",
            Capability::Lifecycle => "lifecycle",
        };
        f.write_str(name)
    }
}

/// Which host threads may call a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadAffinity {
    /// Callable from any thread
    Any,
    /// Must run on the host's main (tick) thread
    MainThread,
}

// ============================================================================
// Wire Types
// ============================================================================

/// A typed entity-data value as understood by the host's serializers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DataValue {
    Byte(u8),
    VarInt(i32),
    Float(f32),
    Vector3(Vector3),
    Quaternion(Quaternion),
    /// Chat component, carried as plain text
    Component(String),
    BlockState(String),
    Item(String),
}

/// One entity-data slot assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub slot: u8,
    pub value: DataValue,
}

impl MetadataEntry {
    pub fn new(slot: u8, value: DataValue) -> Self {
        Self { slot, value }
    }
}

/// Version-independent description of a clientbound packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "packet", rename_all = "snake_case")]
pub enum Packet {
    Spawn {
        entity_id: i32,
        model: ModelId,
        entity_type: String,
        location: Location,
    },
    EntityData {
        entity_id: i32,
        entries: Vec<MetadataEntry>,
    },
    Teleport {
        entity_id: i32,
        location: Location,
        duration: i32,
    },
    Remove {
        entity_ids: Vec<i32>,
    },
}

/// A packet addressed to one viewer, stamped with the protocol it was encoded for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPacket {
    pub viewer: ViewerId,
    pub protocol: i32,
    pub packet: Packet,
}

/// Point-in-time copy of a model's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub id: ModelId,
    pub entity_id: i32,
    pub location: Location,
    pub properties: ModelProperties,
    pub tracked: bool,
    pub viewers: Vec<ViewerId>,
}

// ============================================================================
// Facade Trait
// ============================================================================

/// Version-independent display-model operations.
///
/// All methods take `&self`; implementations synchronize internally so one
/// facade can be shared across host threads. Operations grouped under a
/// [`ThreadAffinity::MainThread`] capability must still be driven from the
/// host's tick thread.
pub trait CapabilityFacade: Send + Sync {
    // ----- Describe -----

    /// Label of the adapter providing this facade
    fn label(&self) -> &str;

    /// Host version range this facade was built for
    fn target_range(&self) -> VersionRange;

    /// Network protocol number of the targeted host
    fn protocol_version(&self) -> i32;

    /// Thread affinity of a capability on this adapter.
    fn affinity(&self, capability: Capability) -> ThreadAffinity {
        capability.default_affinity()
    }

    // ----- Spawn -----

    /// Creates a model with default properties.
    fn spawn_model(&self, location: Location, kind: ModelKind) -> Result<ModelId, FacadeError> {
        self.spawn_model_with(location, kind, &mut |_: &mut ModelProperties| -> Result<(), ModelError> {
            Ok(())
        })
    }

    /// Creates a model and applies `editor` before it becomes visible.
    ///
    /// If the editor fails, no model is created.
    fn spawn_model_with(
        &self,
        location: Location,
        kind: ModelKind,
        editor: PropertyEditor<'_>,
    ) -> Result<ModelId, FacadeError>;

    // ----- Edit -----

    /// Applies `editor` to an existing model. A failing editor leaves the
    /// model unchanged.
    fn edit_model(&self, id: ModelId, editor: PropertyEditor<'_>) -> Result<(), FacadeError>;

    fn model(&self, id: ModelId) -> Result<ModelSnapshot, FacadeError>;

    // ----- Track -----

    fn track(&self, id: ModelId) -> Result<(), FacadeError>;

    fn release(&self, id: ModelId) -> Result<(), FacadeError>;

    fn is_tracked(&self, id: ModelId) -> bool;

    fn tracked_count(&self) -> usize;

    // ----- Viewers -----

    /// Returns `true` if the viewer was newly added.
    fn add_viewer(&self, id: ModelId, viewer: ViewerId) -> Result<bool, FacadeError>;

    /// Returns `true` if the viewer was present.
    fn remove_viewer(&self, id: ModelId, viewer: ViewerId) -> Result<bool, FacadeError>;

    fn viewers(&self, id: ModelId) -> Result<Vec<ViewerId>, FacadeError>;

    // ----- Render -----

    /// Sends the model with its full state to every viewer.
    fn render(&self, id: ModelId) -> Result<(), FacadeError>;

    fn teleport(&self, id: ModelId, location: Location, duration: i32) -> Result<(), FacadeError>;

    /// Despawns the model for its viewers and forgets it.
    fn remove(&self, id: ModelId) -> Result<(), FacadeError>;

    // ----- Update -----

    /// Flushes pending property changes of every tracked model.
    ///
    /// # Returns
    ///
    /// The number of models that had changes to send.
    fn update_all(&self) -> usize;

    /// Flushes one model. Returns `false` if it had nothing to send.
    fn update_model(&self, id: ModelId) -> Result<bool, FacadeError>;

    // ----- Outbound -----

    fn drain_outbound(&self) -> Vec<OutboundPacket>;

    // ----- Lifecycle -----

    /// Called once when the loader disables the binding.
    fn shutdown(&self);
}

impl fmt::Debug for dyn CapabilityFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityFacade")
            .field("label", &self.label())
            .field("target_range", &self.target_range())
            .field("protocol_version", &self.protocol_version())
            .finish()
    }
}
