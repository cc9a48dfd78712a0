//! Error taxonomy for version detection, adapter registration and binding.
//!
//! Every error here is fatal to the enable sequence. None of them are retried:
//! the host version and the set of bundled adapters are both fixed for the
//! lifetime of the process, so a second attempt would fail the same way.

use crate::loader::LoaderState;
use crate::version::{VersionIdentifier, VersionRange};

/// Errors produced while reading or parsing the host version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The host did not expose a version string at all
    #[error("Host version unavailable: {source_name} is missing or empty")]
    Missing {
        /// Where the probe looked (environment variable, host metadata, ...)
        source_name: String,
    },
    /// The host exposed a version string that cannot be read as `major.minor[.patch]`
    #[error("Malformed host version '{input}': {reason}")]
    Malformed {
        /// The raw string as supplied by the host
        input: String,
        /// Human readable explanation of what was wrong
        reason: String,
    },
    /// The probe panicked while reading host metadata
    #[error("Host version probe {source_name} panicked: {message}")]
    Panicked { source_name: String, message: String },
}

impl ProbeError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        ProbeError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the adapter registry.
///
/// `DuplicateRange`, `Closed` and `InvalidRange` are configuration mistakes in
/// the adapter modules. `NoMatch` means the running host is not covered by any
/// bundled adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A descriptor's range overlaps one that is already registered
    #[error(
        "Adapter '{label}' covers {range}, which overlaps adapter '{existing_label}' covering {existing_range}"
    )]
    DuplicateRange {
        label: String,
        range: VersionRange,
        existing_label: String,
        existing_range: VersionRange,
    },
    /// Registration was attempted after the registry was frozen
    #[error("Adapter '{label}' registered after the adapter registry was closed")]
    Closed { label: String },
    /// No registered range contains the detected host version
    #[error("No adapter supports host version {version}; supported: {}", format_supported(.supported))]
    NoMatch {
        version: VersionIdentifier,
        /// Every registered `(label, range)` pair, in registration order
        supported: Vec<(String, VersionRange)>,
    },
    /// A range whose upper bound lies below its lower bound
    #[error("Invalid version range: lower bound {lower} is above upper bound {upper}")]
    InvalidRange {
        lower: VersionIdentifier,
        upper: VersionIdentifier,
    },
}

fn format_supported(supported: &[(String, VersionRange)]) -> String {
    if supported.is_empty() {
        return "none (no adapters registered)".to_string();
    }

    supported
        .iter()
        .map(|(label, range)| format!("{label} {range}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while an adapter constructs its facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    /// The adapter found host internals it was not built against
    #[error("Adapter '{label}' cannot bind to host internals: {reason}")]
    HostMismatch { label: String, reason: String },
    /// Any other construction failure
    #[error("Adapter '{label}' failed to initialize: {reason}")]
    Initialization { label: String, reason: String },
    /// The factory panicked; the panic was contained at the binding boundary
    #[error("Adapter '{label}' panicked during construction: {message}")]
    Panicked { label: String, message: String },
}

/// Errors surfaced by the loader's enable sequence.
///
/// From the caller's point of view every variant means the same thing: the
/// facade was not published and the plugin must not enable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    /// `enable` was called outside of the `Unloaded` state
    #[error("Loader cannot enable from state {state}")]
    InvalidState { state: LoaderState },
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Registration(#[from] RegistryError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
    /// The facade was requested while the loader was not active
    #[error("No adapter is bound (loader state: {state})")]
    NotActive { state: LoaderState },
}

/// Errors returned by facade operations on models.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacadeError {
    #[error("Unknown model: {0}")]
    UnknownModel(crate::model::ModelId),
    #[error("Model {0} is not tracked")]
    NotTracked(crate::model::ModelId),
    #[error(transparent)]
    InvalidProperty(#[from] ModelError),
}

/// Validation failures for model properties.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{name} must be between {min} and {max}, but was {value}")]
    OutOfRange {
        name: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("Shadow radius must be between 0 and 64, but was {0}")]
    ShadowRadius(f32),
    #[error("Invalid hex color '{0}'")]
    InvalidColor(String),
    /// Spawned entities keep their type; a model cannot turn into another kind
    #[error("A {from} model cannot become a {to} model")]
    KindChange { from: &'static str, to: &'static str },
}
