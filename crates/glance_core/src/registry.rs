//! Static table of bundled adapters.
//!
//! Adapter modules append a descriptor during the registration phase; the
//! loader closes the registry before probing and from then on the table is
//! read-only. Ranges are kept pairwise disjoint so resolution never has to
//! break a tie.

use crate::error::{FactoryError, RegistryError};
use crate::facade::CapabilityFacade;
use crate::version::{VersionIdentifier, VersionRange};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Zero-argument constructor for an adapter's facade
pub type AdapterFactory = Arc<dyn Fn() -> Result<Box<dyn CapabilityFacade>, FactoryError> + Send + Sync>;

/// One bundled adapter: the versions it covers and how to build it.
#[derive(Clone)]
pub struct AdapterDescriptor {
    range: VersionRange,
    factory: AdapterFactory,
    label: String,
}

impl AdapterDescriptor {
    pub fn new<F>(label: impl Into<String>, range: VersionRange, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn CapabilityFacade>, FactoryError> + Send + Sync + 'static,
    {
        Self {
            range,
            factory: Arc::new(factory),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn range(&self) -> &VersionRange {
        &self.range
    }

    pub fn factory(&self) -> &AdapterFactory {
        &self.factory
    }
}

impl fmt::Debug for AdapterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterDescriptor")
            .field("label", &self.label)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Append-only registry of adapter descriptors.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    descriptors: Vec<AdapterDescriptor>,
    /// Rejected registrations, replayed by `close()`
    rejected: Vec<RegistryError>,
    closed: bool,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The adapter to add
    ///
    /// # Returns
    ///
    /// `Err(Closed)` after `close()`, `Err(DuplicateRange)` if the range
    /// overlaps an already registered one. A rejected descriptor is dropped
    /// and the first registration is retained.
    pub fn register(&mut self, descriptor: AdapterDescriptor) -> Result<(), RegistryError> {
        if self.closed {
            let error = RegistryError::Closed {
                label: descriptor.label.clone(),
            };
            warn!("⚠️ {}", error);
            self.rejected.push(error.clone());
            return Err(error);
        }

        if let Some(existing) = self
            .descriptors
            .iter()
            .find(|existing| existing.range.overlaps(&descriptor.range))
        {
            let error = RegistryError::DuplicateRange {
                label: descriptor.label.clone(),
                range: descriptor.range.clone(),
                existing_label: existing.label.clone(),
                existing_range: existing.range.clone(),
            };
            warn!("⚠️ {}", error);
            self.rejected.push(error.clone());
            return Err(error);
        }

        debug!("Registered adapter '{}' for {}", descriptor.label, descriptor.range);
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Freezes the registry. Idempotent.
    ///
    /// Fails with the first registration error seen so far, so a
    /// misconfigured adapter set is reported even if the module that
    /// registered it ignored the result of `register`.
    pub fn close(&mut self) -> Result<(), RegistryError> {
        if !self.closed {
            self.closed = true;
            info!("🔒 Adapter registry closed with {} adapter(s)", self.descriptors.len());
        }

        if let Some(error) = self.rejected.first() {
            return Err(error.clone());
        }

        for (index, a) in self.descriptors.iter().enumerate() {
            for b in &self.descriptors[index + 1..] {
                if a.range.overlaps(&b.range) {
                    return Err(RegistryError::DuplicateRange {
                        label: b.label.clone(),
                        range: b.range.clone(),
                        existing_label: a.label.clone(),
                        existing_range: a.range.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Finds the descriptor whose range contains `version`.
    pub fn resolve(&self, version: &VersionIdentifier) -> Result<AdapterDescriptor, RegistryError> {
        let mut matches = self
            .descriptors
            .iter()
            .filter(|descriptor| descriptor.range.contains(version));

        let found = matches.next();
        debug_assert!(matches.next().is_none(), "adapter ranges must be disjoint");

        match found {
            Some(descriptor) => Ok(descriptor.clone()),
            None => Err(RegistryError::NoMatch {
                version: version.clone(),
                supported: self.supported_ranges(),
            }),
        }
    }

    /// `(label, range)` of every registered adapter, in registration order
    pub fn supported_ranges(&self) -> Vec<(String, VersionRange)> {
        self.descriptors
            .iter()
            .map(|descriptor| (descriptor.label.clone(), descriptor.range.clone()))
            .collect()
    }

    pub fn descriptors(&self) -> &[AdapterDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u32, minor: u32, patch: u32) -> VersionIdentifier {
        VersionIdentifier::new(major, minor, patch)
    }

    fn failing_descriptor(label: &str, range: VersionRange) -> AdapterDescriptor {
        let owned = label.to_string();
        AdapterDescriptor::new(label, range, move || {
            Err(FactoryError::Initialization {
                label: owned.clone(),
                reason: "not built in unit tests".to_string(),
            })
        })
    }

    fn two_adapters() -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        registry
            .register(failing_descriptor("paper-1.20.6", VersionRange::exact(v(1, 20, 6))))
            .unwrap();
        registry
            .register(failing_descriptor(
                "paper-1.21",
                VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap(),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_resolve_picks_containing_range() {
        let registry = two_adapters();

        assert_eq!(registry.resolve(&v(1, 20, 6)).unwrap().label(), "paper-1.20.6");
        assert_eq!(registry.resolve(&v(1, 21, 0)).unwrap().label(), "paper-1.21");
        assert_eq!(registry.resolve(&v(1, 21, 8)).unwrap().label(), "paper-1.21");
    }

    #[test]
    fn test_resolve_outside_all_ranges() {
        let registry = two_adapters();

        for version in [v(1, 20, 5), v(1, 22, 0), v(2, 0, 0)] {
            match registry.resolve(&version) {
                Err(RegistryError::NoMatch { version: reported, supported }) => {
                    assert_eq!(reported, version);
                    assert_eq!(supported.len(), 2);
                }
                other => panic!("expected NoMatch for {version}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_overlapping_registration_keeps_first() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(failing_descriptor(
                "first",
                VersionRange::inclusive(v(1, 20, 0), v(1, 21, 0)).unwrap(),
            ))
            .unwrap();

        let result = registry.register(failing_descriptor(
            "second",
            VersionRange::inclusive(v(1, 20, 5), v(1, 22, 0)).unwrap(),
        ));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateRange { ref label, ref existing_label, .. })
                if label == "second" && existing_label == "first"
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors()[0].label(), "first");
    }

    #[test]
    fn test_close_reports_ignored_rejection() {
        let mut registry = two_adapters();
        let _ = registry.register(failing_descriptor("clash", VersionRange::exact(v(1, 21, 3))));

        assert!(matches!(registry.close(), Err(RegistryError::DuplicateRange { .. })));
        // Still failing on a second close
        assert!(registry.close().is_err());
    }

    #[test]
    fn test_register_after_close() {
        let mut registry = two_adapters();
        registry.close().unwrap();
        registry.close().unwrap();
        assert!(registry.is_closed());

        let result = registry.register(failing_descriptor("late", VersionRange::exact(v(1, 19, 4))));
        assert_eq!(
            result,
            Err(RegistryError::Closed {
                label: "late".to_string()
            })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_adjacent_half_open_ranges_do_not_overlap() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(failing_descriptor(
                "a",
                VersionRange::half_open(v(1, 20, 0), v(1, 21, 0)).unwrap(),
            ))
            .unwrap();
        registry
            .register(failing_descriptor(
                "b",
                VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap(),
            ))
            .unwrap();
        assert!(registry.close().is_ok());
    }
}
