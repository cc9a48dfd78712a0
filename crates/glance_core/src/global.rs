//! Process-wide entry points.
//!
//! Adapter modules register through [`register_adapter`], the host shim
//! drives [`enable`]/[`disable`], and gameplay code reaches the bound adapter
//! through [`facade`] or [`require_facade`]. All of them share one lazily
//! created [`Loader`].

use crate::error::{LoaderError, RegistryError};
use crate::facade::CapabilityFacade;
use crate::loader::{BindingInfo, Loader, LoaderState};
use crate::probe::VersionProbe;
use crate::registry::AdapterDescriptor;
use crate::version::VersionRange;
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    static ref LOADER: Loader = Loader::default();
}

/// The process-wide loader
pub fn loader() -> &'static Loader {
    &LOADER
}

/// Registers a bundled adapter. Must happen before [`enable`].
pub fn register_adapter(descriptor: AdapterDescriptor) -> Result<(), RegistryError> {
    LOADER.register(descriptor)
}

pub fn enable(probe: &dyn VersionProbe) -> Result<Arc<dyn CapabilityFacade>, LoaderError> {
    LOADER.enable(probe)
}

pub fn disable() -> LoaderState {
    LOADER.disable()
}

pub fn status() -> LoaderState {
    LOADER.status()
}

/// The bound facade, or `None` unless the loader is active.
pub fn facade() -> Option<Arc<dyn CapabilityFacade>> {
    LOADER.facade()
}

pub fn require_facade() -> Result<Arc<dyn CapabilityFacade>, LoaderError> {
    LOADER.require_facade()
}

pub fn bound_adapter() -> Option<BindingInfo> {
    LOADER.bound_adapter()
}

/// `(label, range)` of every registered adapter
pub fn supported_ranges() -> Vec<(String, VersionRange)> {
    LOADER.with_registry(|registry| registry.supported_ranges())
}
