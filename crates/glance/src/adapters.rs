//! The adapters compiled into this binary and how they reach the loader.

use glance_core::{global, AdapterDescriptor, RegistryError};
use serde::Serialize;
use tracing::{info, warn};

/// One adapter crate linked into the shim
#[derive(Clone, Copy)]
pub struct BundledAdapter {
    pub label: &'static str,
    pub protocol: i32,
    pub descriptor: fn() -> Result<AdapterDescriptor, RegistryError>,
}

/// What `--list-adapters` prints for each adapter
#[derive(Debug, Serialize)]
pub struct AdapterListing {
    pub label: String,
    pub range: String,
    pub protocol: i32,
    pub allowed: bool,
}

pub fn bundled() -> Vec<BundledAdapter> {
    vec![
        BundledAdapter {
            label: glance_runtime_1_20_6::LABEL,
            protocol: glance_runtime_1_20_6::PROTOCOL_VERSION,
            descriptor: glance_runtime_1_20_6::descriptor,
        },
        BundledAdapter {
            label: glance_runtime_1_21::LABEL,
            protocol: glance_runtime_1_21::PROTOCOL_VERSION,
            descriptor: glance_runtime_1_21::descriptor,
        },
    ]
}

fn is_allowed(allow: &[String], label: &str) -> bool {
    allow.is_empty() || allow.iter().any(|entry| entry == label)
}

/// Registers every allowed bundled adapter with the global loader.
///
/// Rejected registrations are logged and skipped; the loader reports them
/// again when it is enabled. Returns how many adapters were accepted.
pub fn register_bundled(allow: &[String]) -> usize {
    let adapters = bundled();

    for entry in allow {
        if !adapters.iter().any(|adapter| adapter.label == entry) {
            warn!("⚠️ Allow-list names unknown adapter '{}'", entry);
        }
    }

    let mut registered = 0;
    for adapter in adapters.iter().filter(|adapter| is_allowed(allow, adapter.label)) {
        let result = (adapter.descriptor)().and_then(global::register_adapter);
        match result {
            Ok(()) => registered += 1,
            Err(e) => warn!("⚠️ Adapter '{}' not registered: {}", adapter.label, e),
        }
    }

    info!("📦 Registered {} of {} bundled adapters", registered, adapters.len());
    registered
}

/// Describes every bundled adapter, marking those the allow-list admits.
pub fn listings(allow: &[String]) -> Vec<AdapterListing> {
    bundled()
        .into_iter()
        .map(|adapter| AdapterListing {
            label: adapter.label.to_string(),
            range: match (adapter.descriptor)() {
                Ok(descriptor) => descriptor.range().to_string(),
                Err(e) => format!("invalid: {e}"),
            },
            protocol: adapter.protocol,
            allowed: is_allowed(allow, adapter.label),
        })
        .collect()
}
