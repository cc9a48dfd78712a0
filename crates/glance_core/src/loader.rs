//! Lifecycle state machine that binds exactly one adapter.
//!
//! ```text
//! Unloaded -> Probing -> Resolved -> Bound -> Active -> Disabled
//!     \          \          \          \
//!      `----------`----------`----------`--> Failed
//! ```
//!
//! `enable` and `disable` run on the host's lifecycle thread. The facade slot
//! is written once on activation and cleared once on disable; readers on
//! other threads only ever see a facade while the published status is
//! `Active`.

use crate::error::{FactoryError, LoaderError, ProbeError};
use crate::facade::CapabilityFacade;
use crate::probe::VersionProbe;
use crate::registry::{AdapterDescriptor, AdapterRegistry};
use crate::version::{VersionIdentifier, VersionRange};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

// ============================================================================
// Loader State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum LoaderState {
    Unloaded = 0,
    Probing = 1,
    Resolved = 2,
    Bound = 3,
    Active = 4,
    Failed = 5,
    Disabled = 6,
}

impl LoaderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoaderState::Unloaded,
            1 => LoaderState::Probing,
            2 => LoaderState::Resolved,
            3 => LoaderState::Bound,
            4 => LoaderState::Active,
            5 => LoaderState::Failed,
            _ => LoaderState::Disabled,
        }
    }

    /// `Failed` and `Disabled` are never left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Failed | LoaderState::Disabled)
    }
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoaderState::Unloaded => "Unloaded",
            LoaderState::Probing => "Probing",
            LoaderState::Resolved => "Resolved",
            LoaderState::Bound => "Bound",
            LoaderState::Active => "Active",
            LoaderState::Failed => "Failed",
            LoaderState::Disabled => "Disabled",
        };
        f.write_str(name)
    }
}

/// Details of the active binding, for operator logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingInfo {
    pub label: String,
    pub range: VersionRange,
    pub host_version: VersionIdentifier,
    pub protocol_version: i32,
}

// ============================================================================
// Loader
// ============================================================================

pub struct Loader {
    registry: Mutex<AdapterRegistry>,
    status: AtomicU8,
    slot: RwLock<Option<Arc<dyn CapabilityFacade>>>,
    binding: RwLock<Option<BindingInfo>>,
}

impl Loader {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self {
            registry: Mutex::new(registry),
            status: AtomicU8::new(LoaderState::Unloaded as u8),
            slot: RwLock::new(None),
            binding: RwLock::new(None),
        }
    }

    pub fn status(&self) -> LoaderState {
        LoaderState::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, state: LoaderState) {
        debug!("Loader transition -> {}", state);
        self.status.store(state as u8, Ordering::Release);
    }

    fn fail(&self, error: LoaderError) -> LoaderError {
        error!("❌ Failed to enable Glance: {}", error);
        self.set_status(LoaderState::Failed);
        error
    }

    /// Registers an adapter with this loader's registry.
    pub fn register(&self, descriptor: AdapterDescriptor) -> Result<(), crate::error::RegistryError> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .register(descriptor)
    }

    /// Runs `f` against the registry, e.g. to list supported ranges.
    pub fn with_registry<R>(&self, f: impl FnOnce(&AdapterRegistry) -> R) -> R {
        f(&self.registry.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Detects the host version, binds the matching adapter and publishes its facade.
    ///
    /// # Arguments
    ///
    /// * `probe` - Source of the host version
    ///
    /// # Returns
    ///
    /// The published facade. On any error the loader ends in `Failed` and
    /// nothing is published.
    pub fn enable(&self, probe: &dyn VersionProbe) -> Result<Arc<dyn CapabilityFacade>, LoaderError> {
        // Claim the transition so concurrent callers cannot both enable.
        if let Err(current) = self.status.compare_exchange(
            LoaderState::Unloaded as u8,
            LoaderState::Probing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            let state = LoaderState::from_u8(current);
            warn!("⚠️ enable() called while loader is {}", state);
            return Err(LoaderError::InvalidState { state });
        }
        debug!("Loader transition -> {}", LoaderState::Probing);

        if let Err(e) = self.registry.lock().unwrap_or_else(PoisonError::into_inner).close() {
            return Err(self.fail(e.into()));
        }

        // The registry lock is not held here; probes may list supported ranges.
        info!("🔍 Detecting host version via {}", probe.describe());
        let version = match Self::detect(probe) {
            Ok(version) => version,
            Err(e) => return Err(self.fail(e.into())),
        };
        info!("🖥️ Host version {}", version);

        let resolved = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(&version);
        let descriptor = match resolved {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.set_status(LoaderState::Resolved);
        info!("📦 Resolved adapter '{}' for {}", descriptor.label(), descriptor.range());

        let facade = match Self::construct(&descriptor) {
            Ok(facade) => facade,
            Err(e) => return Err(self.fail(e.into())),
        };
        self.set_status(LoaderState::Bound);

        let facade: Arc<dyn CapabilityFacade> = Arc::from(facade);
        let info = BindingInfo {
            label: descriptor.label().to_string(),
            range: descriptor.range().clone(),
            host_version: version,
            protocol_version: facade.protocol_version(),
        };

        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(facade.clone());
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) = Some(info.clone());
        self.set_status(LoaderState::Active);

        info!(
            "✅ Glance enabled with adapter '{}' (host {}, protocol {})",
            info.label, info.host_version, info.protocol_version
        );
        Ok(facade)
    }

    /// Runs the probe, containing any panic.
    fn detect(probe: &dyn VersionProbe) -> Result<VersionIdentifier, ProbeError> {
        match catch_unwind(AssertUnwindSafe(|| probe.detect())) {
            Ok(result) => result,
            Err(panic_info) => Err(ProbeError::Panicked {
                source_name: probe.describe(),
                message: panic_message(panic_info.as_ref()),
            }),
        }
    }

    /// Invokes a descriptor's factory, containing any panic.
    fn construct(descriptor: &AdapterDescriptor) -> Result<Box<dyn CapabilityFacade>, FactoryError> {
        let factory = descriptor.factory().clone();
        match catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(result) => result,
            Err(panic_info) => Err(FactoryError::Panicked {
                label: descriptor.label().to_string(),
                message: panic_message(panic_info.as_ref()),
            }),
        }
    }

    /// Tears down the active binding.
    ///
    /// From `Active` this unpublishes the facade, calls its `shutdown` hook
    /// and moves to `Disabled`. In any other state it does nothing, since the
    /// host disables plugins whose enable failed too.
    ///
    /// # Returns
    ///
    /// The state after the call.
    pub fn disable(&self) -> LoaderState {
        if self
            .status
            .compare_exchange(
                LoaderState::Active as u8,
                LoaderState::Disabled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            let state = self.status();
            debug!("disable() with loader {}, nothing to tear down", state);
            return state;
        }
        debug!("Loader transition -> {}", LoaderState::Disabled);

        let facade = self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
        let binding = self.binding.write().unwrap_or_else(PoisonError::into_inner).take();

        if let Some(facade) = facade {
            facade.shutdown();
        }
        if let Some(binding) = binding {
            info!("🛑 Glance disabled, released adapter '{}'", binding.label);
        }

        LoaderState::Disabled
    }

    /// The published facade, `Some` only while `Active`.
    pub fn facade(&self) -> Option<Arc<dyn CapabilityFacade>> {
        if self.status() != LoaderState::Active {
            return None;
        }
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Like [`Loader::facade`], but reports the current state when inactive.
    pub fn require_facade(&self) -> Result<Arc<dyn CapabilityFacade>, LoaderError> {
        self.facade().ok_or_else(|| LoaderError::NotActive { state: self.status() })
    }

    pub fn bound_adapter(&self) -> Option<BindingInfo> {
        if self.status() != LoaderState::Active {
            return None;
        }
        self.binding.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(AdapterRegistry::new())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("status", &self.status())
            .field("binding", &self.bound_adapter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trips_through_u8() {
        for state in [
            LoaderState::Unloaded,
            LoaderState::Probing,
            LoaderState::Resolved,
            LoaderState::Bound,
            LoaderState::Active,
            LoaderState::Failed,
            LoaderState::Disabled,
        ] {
            assert_eq!(LoaderState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(LoaderState::Failed.is_terminal());
        assert!(LoaderState::Disabled.is_terminal());
        assert!(!LoaderState::Active.is_terminal());
    }

    #[test]
    fn test_disable_before_enable_is_noop() {
        let loader = Loader::default();
        assert_eq!(loader.disable(), LoaderState::Unloaded);
        assert_eq!(loader.status(), LoaderState::Unloaded);
        assert!(loader.facade().is_none());
    }

    #[test]
    fn test_require_facade_reports_state() {
        let loader = Loader::default();
        assert_eq!(
            loader.require_facade().err(),
            Some(LoaderError::NotActive {
                state: LoaderState::Unloaded
            })
        );
    }
}
