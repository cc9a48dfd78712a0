//! # Glance Runtime 1.20.6
//!
//! Adapter for hosts reporting exactly 1.20.6 (protocol 766). Call
//! [`register`] before the loader is enabled.

use glance_common::{DisplayEngine, EngineProfile, DISPLAY_LAYOUT};
use glance_core::{FactoryError, VersionIdentifier, VersionRange};
use tracing::debug;

pub const LABEL: &str = "paper-1.20.6";
pub const PROTOCOL_VERSION: i32 = 766;

/// Host version this adapter was built for
pub const TARGET: VersionIdentifier = VersionIdentifier::new(1, 20, 6);

pub fn profile() -> EngineProfile {
    EngineProfile {
        label: LABEL,
        range: VersionRange::exact(TARGET),
        protocol: PROTOCOL_VERSION,
        accessors: DISPLAY_LAYOUT,
    }
}

/// Builds the facade; invoked by the loader only when this adapter is selected.
pub fn create() -> Result<DisplayEngine, FactoryError> {
    debug!("Binding {} display engine", LABEL);
    DisplayEngine::new(profile())
}

glance_core::export_adapter! {
    label: LABEL,
    range: VersionRange::exact(TARGET),
    api_version: 1,
    factory: create,
}
