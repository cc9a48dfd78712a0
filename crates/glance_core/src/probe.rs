//! Host version detection.
//!
//! A probe only reads host metadata; it never mutates anything.

use crate::error::ProbeError;
use crate::version::VersionIdentifier;
use std::fmt;

/// Environment variable consulted by [`EnvProbe::default`]
pub const DEFAULT_VERSION_ENV: &str = "GLANCE_HOST_VERSION";

/// Reads the running host's version.
pub trait VersionProbe {
    fn detect(&self) -> Result<VersionIdentifier, ProbeError>;

    /// Short description used in logs
    fn describe(&self) -> String {
        "version probe".to_string()
    }
}

/// Probe over a version string handed in by the host shim.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    raw: String,
}

impl StaticProbe {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl VersionProbe for StaticProbe {
    fn detect(&self) -> Result<VersionIdentifier, ProbeError> {
        VersionIdentifier::parse(&self.raw)
    }

    fn describe(&self) -> String {
        format!("static '{}'", self.raw)
    }
}

/// Probe reading an environment variable.
#[derive(Debug, Clone)]
pub struct EnvProbe {
    variable: String,
}

impl EnvProbe {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Default for EnvProbe {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_ENV)
    }
}

impl VersionProbe for EnvProbe {
    fn detect(&self) -> Result<VersionIdentifier, ProbeError> {
        match std::env::var(&self.variable) {
            Ok(raw) if !raw.trim().is_empty() => VersionIdentifier::parse(&raw),
            _ => Err(ProbeError::Missing {
                source_name: format!("environment variable {}", self.variable),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("env ${}", self.variable)
    }
}

/// How a [`HostMetadataProbe`] interprets the string it reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    /// A bare version such as `1.21.1-R0.1-SNAPSHOT`
    Version,
    /// A server banner such as `git-Paper-496 (MC: 1.20.6)`
    Banner,
}

/// Probe backed by a host-supplied accessor.
///
/// This is the seam a host integration uses to expose its own metadata
/// without the core knowing anything about the host.
pub struct HostMetadataProbe {
    name: String,
    format: MetadataFormat,
    read: Box<dyn Fn() -> Option<String> + Send + Sync>,
}

impl HostMetadataProbe {
    pub fn new<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            format: MetadataFormat::Version,
            read: Box::new(read),
        }
    }

    /// Like [`HostMetadataProbe::new`], but the accessor returns a server banner.
    pub fn from_banner<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self {
            format: MetadataFormat::Banner,
            ..Self::new(name, read)
        }
    }
}

impl fmt::Debug for HostMetadataProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMetadataProbe")
            .field("name", &self.name)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl VersionProbe for HostMetadataProbe {
    fn detect(&self) -> Result<VersionIdentifier, ProbeError> {
        let raw = (self.read)()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ProbeError::Missing {
                source_name: self.name.clone(),
            })?;

        match self.format {
            MetadataFormat::Version => VersionIdentifier::parse(&raw),
            MetadataFormat::Banner => VersionIdentifier::from_host_banner(&raw),
        }
    }

    fn describe(&self) -> String {
        format!("host metadata '{}'", self.name)
    }
}
