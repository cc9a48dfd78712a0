//! # Glance Common
//!
//! Building blocks shared by the version-specific runtime adapters:
//!
//! - [`accessors`] - entity-data slot layout of display entities
//! - [`metadata`] - encoding of model properties into entity data
//! - [`tracker`] - concurrent model store and outbound packet queue
//! - [`engine`] - a complete `CapabilityFacade` parameterized by an [`EngineProfile`]
//!
//! Adapters differ only in the profile they hand to [`DisplayEngine::new`];
//! both bundled ones use [`DISPLAY_LAYOUT`].

pub mod accessors;
pub mod bitmask;
pub mod engine;
pub mod metadata;
pub mod tracker;

pub use accessors::{BlockSlots, DataAccessors, DisplaySlots, EntityTypes, ItemSlots, TextSlots, DISPLAY_LAYOUT};
pub use engine::{DisplayEngine, EngineProfile};
pub use metadata::{EntityMetadata, MetadataEncoder};
pub use tracker::{ModelTracker, TrackedModel};
