//! # Glance Core
//!
//! Host version detection and adapter dispatch for the Glance display-model
//! plugin.
//!
//! One logical plugin ships a pre-built adapter per supported host version.
//! At enable time the [`Loader`] asks a [`VersionProbe`] for the running host
//! version, resolves the single [`AdapterDescriptor`] whose range contains it,
//! constructs that adapter and publishes it as a [`CapabilityFacade`].
//! Gameplay code only depends on the facade.
//!
//! ## Flow
//!
//! 1. Each adapter crate calls its generated `register()` (see [`export_adapter!`])
//! 2. The host shim calls [`global::enable`] with a probe
//! 3. Gameplay code reaches the adapter through [`global::facade`]
//! 4. The host shim calls [`global::disable`] on shutdown
//!
//! If no adapter covers the host, enable fails with an error naming the
//! detected version and every supported range, and nothing is published.

pub mod error;
pub mod facade;
pub mod global;
pub mod loader;
pub mod macros;
pub mod model;
pub mod probe;
pub mod registry;
pub mod version;

pub use error::{FacadeError, FactoryError, LoaderError, ModelError, ProbeError, RegistryError};
pub use facade::{
    Capability, CapabilityFacade, DataValue, MetadataEntry, ModelSnapshot, OutboundPacket, Packet,
    PropertyEditor, ThreadAffinity,
};
pub use loader::{BindingInfo, Loader, LoaderState};
pub use model::{
    Billboard, Brightness, Color, Culling, Interpolation, Location, ModelId, ModelKind, ModelProperties,
    Quaternion, Shadow, TextAlignment, TextSpec, Transform, Vector3, ViewerId,
};
pub use probe::{EnvProbe, HostMetadataProbe, StaticProbe, VersionProbe, DEFAULT_VERSION_ENV};
pub use registry::{AdapterDescriptor, AdapterFactory, AdapterRegistry};
pub use version::{IntoVersionRange, UpperBound, VersionIdentifier, VersionRange};

/// Version of the [`CapabilityFacade`] trait.
///
/// Bumped whenever the trait changes shape; [`export_adapter!`] refuses to
/// compile an adapter declaring a different value.
pub const FACADE_API_VERSION: u32 = 1;

/// Version of this crate
pub const GLANCE_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
