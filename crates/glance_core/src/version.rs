//! Host version identifiers and version ranges.
//!
//! Host platforms report versions such as `1.20.6-R0.1-SNAPSHOT`. Only the
//! leading `major.minor.patch` takes part in ordering and matching; everything
//! after the first `-` is kept verbatim as an opaque build tag.

use crate::error::{ProbeError, RegistryError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// ============================================================================
// Version Identifier
// ============================================================================

/// A parsed host API version.
///
/// Equality, ordering and hashing only consider `(major, minor, patch)`. The
/// build tag is metadata: `1.21.1-R0.1-SNAPSHOT` and `1.21.1` compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VersionIdentifier {
    major: u32,
    minor: u32,
    patch: u32,
    build: Option<String>,
}

impl VersionIdentifier {
    /// Creates a version without a build tag.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build: None,
        }
    }

    /// Returns a copy of this version carrying the given build tag.
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        let build = build.into();
        self.build = if build.is_empty() { None } else { Some(build) };
        self
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// The opaque build/revision tag, e.g. `R0.1-SNAPSHOT`.
    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Parses a host version string.
    ///
    /// Accepted shapes:
    ///
    /// * `1.20.6-R0.1-SNAPSHOT` → `1.20.6`, tag `R0.1-SNAPSHOT`
    /// * `1.21-R0.1-SNAPSHOT` → `1.21.0` (a missing patch is zero)
    /// * `1.21.1rc1`, `1.20.6+build.7` → unrecognized suffixes move into the
    ///   build tag instead of failing
    ///
    /// # Errors
    ///
    /// `ProbeError::Missing` for blank input, `ProbeError::Malformed` when the
    /// numeric head is not `major.minor[.patch]`.
    pub fn parse(input: &str) -> Result<Self, ProbeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ProbeError::Missing {
                source_name: "host version string".to_string(),
            });
        }

        let (head, tail) = match trimmed.split_once('-') {
            Some((head, tail)) => (head, Some(tail)),
            None => (trimmed, None),
        };

        // The numeric head stops at the first character that is neither a digit nor a dot
        let numeric_end = head
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(head.len());
        let mut numeric = &head[..numeric_end];
        let suffix = &head[numeric_end..];
        if suffix.is_empty() {
            // "1.20.6." style trailing dots are noise, not an empty component
            numeric = numeric.trim_end_matches('.');
        } else if let Some(stripped) = numeric.strip_suffix('.') {
            // "1.20.6.rc1": the dot separates the suffix
            numeric = stripped;
        }

        if numeric.is_empty() {
            return Err(ProbeError::malformed(input, "does not start with a numeric version"));
        }

        let mut components = [0u32; 3];
        let mut count = 0;
        for part in numeric.split('.') {
            if count == components.len() {
                return Err(ProbeError::malformed(input, "more than three numeric components"));
            }
            if part.is_empty() {
                return Err(ProbeError::malformed(input, "empty version component"));
            }
            components[count] = part.parse::<u32>().map_err(|_| {
                ProbeError::malformed(input, format!("component '{part}' is out of range"))
            })?;
            count += 1;
        }

        if count < 2 {
            return Err(ProbeError::malformed(input, "expected at least major.minor"));
        }

        let suffix = suffix.trim_start_matches(|c: char| matches!(c, '+' | '.' | '_' | '~'));
        let build = match (suffix.is_empty(), tail.filter(|t| !t.is_empty())) {
            (true, None) => None,
            (true, Some(tail)) => Some(tail.to_string()),
            (false, None) => Some(suffix.to_string()),
            (false, Some(tail)) => Some(format!("{suffix}-{tail}")),
        };

        Ok(Self {
            major: components[0],
            minor: components[1],
            patch: components[2],
            build,
        })
    }

    /// Extracts the version out of a server banner such as
    /// `git-Paper-496 (MC: 1.20.6)`. Strings without the `(MC: ...)` marker
    /// are parsed as plain version strings.
    pub fn from_host_banner(banner: &str) -> Result<Self, ProbeError> {
        const MARKER: &str = "(MC: ";

        match banner.find(MARKER) {
            Some(start) => {
                let rest = &banner[start + MARKER.len()..];
                let end = rest
                    .find(')')
                    .ok_or_else(|| ProbeError::malformed(banner, "unterminated '(MC: ' marker"))?;
                Self::parse(&rest[..end])
            }
            None => Self::parse(banner),
        }
    }

    fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for VersionIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for VersionIdentifier {}

impl PartialOrd for VersionIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl Hash for VersionIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(build) = &self.build {
            write!(f, "-{build}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionIdentifier {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<VersionIdentifier> for String {
    fn from(version: VersionIdentifier) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for VersionIdentifier {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// ============================================================================
// Version Range
// ============================================================================

/// Upper end of a [`VersionRange`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpperBound {
    Inclusive(VersionIdentifier),
    Exclusive(VersionIdentifier),
}

/// A non-empty range of host versions with an inclusive lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct VersionRange {
    lower: VersionIdentifier,
    upper: UpperBound,
}

#[derive(Deserialize)]
struct RangeBounds {
    lower: VersionIdentifier,
    upper: UpperBound,
}

impl TryFrom<RangeBounds> for VersionRange {
    type Error = RegistryError;

    fn try_from(bounds: RangeBounds) -> Result<Self, Self::Error> {
        match bounds.upper {
            UpperBound::Inclusive(upper) => VersionRange::inclusive(bounds.lower, upper),
            UpperBound::Exclusive(upper) => VersionRange::half_open(bounds.lower, upper),
        }
    }
}

impl VersionRange {
    /// `[lower, upper]`
    pub fn inclusive(
        lower: VersionIdentifier,
        upper: VersionIdentifier,
    ) -> Result<Self, RegistryError> {
        if lower > upper {
            return Err(RegistryError::InvalidRange { lower, upper });
        }
        Ok(Self {
            lower,
            upper: UpperBound::Inclusive(upper),
        })
    }

    /// `[lower, upper)`
    pub fn half_open(
        lower: VersionIdentifier,
        upper: VersionIdentifier,
    ) -> Result<Self, RegistryError> {
        if lower >= upper {
            return Err(RegistryError::InvalidRange { lower, upper });
        }
        Ok(Self {
            lower,
            upper: UpperBound::Exclusive(upper),
        })
    }

    /// `[version, version]`
    pub fn exact(version: VersionIdentifier) -> Self {
        Self {
            lower: version.clone(),
            upper: UpperBound::Inclusive(version),
        }
    }

    pub fn lower(&self) -> &VersionIdentifier {
        &self.lower
    }

    pub fn upper(&self) -> &UpperBound {
        &self.upper
    }

    pub fn contains(&self, version: &VersionIdentifier) -> bool {
        if version < &self.lower {
            return false;
        }
        match &self.upper {
            UpperBound::Inclusive(upper) => version <= upper,
            UpperBound::Exclusive(upper) => version < upper,
        }
    }

    /// Two ranges overlap when at least one version lies in both.
    ///
    /// Both ranges are non-empty and contain their lower bound, so they share a
    /// version exactly when one of them contains the other's lower bound.
    pub fn overlaps(&self, other: &VersionRange) -> bool {
        self.contains(&other.lower) || other.contains(&self.lower)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lower = VersionIdentifier::new(self.lower.major, self.lower.minor, self.lower.patch);
        match &self.upper {
            UpperBound::Inclusive(upper) => write!(
                f,
                "[{lower}, {}]",
                VersionIdentifier::new(upper.major, upper.minor, upper.patch)
            ),
            UpperBound::Exclusive(upper) => write!(
                f,
                "[{lower}, {})",
                VersionIdentifier::new(upper.major, upper.minor, upper.patch)
            ),
        }
    }
}

/// Anything an adapter may declare as its range: a ready range, or the
/// result of one of the checked constructors.
pub trait IntoVersionRange {
    fn into_range(self) -> Result<VersionRange, RegistryError>;
}

impl IntoVersionRange for VersionRange {
    fn into_range(self) -> Result<VersionRange, RegistryError> {
        Ok(self)
    }
}

impl IntoVersionRange for Result<VersionRange, RegistryError> {
    fn into_range(self) -> Result<VersionRange, RegistryError> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u32, minor: u32, patch: u32) -> VersionIdentifier {
        VersionIdentifier::new(major, minor, patch)
    }

    #[test]
    fn test_parse_paper_snapshot_strings() {
        let version = VersionIdentifier::parse("1.20.6-R0.1-SNAPSHOT").unwrap();
        assert_eq!((version.major(), version.minor(), version.patch()), (1, 20, 6));
        assert_eq!(version.build(), Some("R0.1-SNAPSHOT"));

        let version = VersionIdentifier::parse("1.21.1-R0.1-SNAPSHOT").unwrap();
        assert_eq!(version, v(1, 21, 1));
        assert_eq!(version.build(), Some("R0.1-SNAPSHOT"));
    }

    #[test]
    fn test_parse_without_patch_defaults_to_zero() {
        let version = VersionIdentifier::parse("1.21-R0.1-SNAPSHOT").unwrap();
        assert_eq!(version, v(1, 21, 0));
        assert_eq!(version.build(), Some("R0.1-SNAPSHOT"));
    }

    #[test]
    fn test_parse_plain_version() {
        let version = VersionIdentifier::parse("  1.22.0 ").unwrap();
        assert_eq!(version, v(1, 22, 0));
        assert_eq!(version.build(), None);
    }

    #[test]
    fn test_parse_moves_unknown_suffix_into_build_tag() {
        let version = VersionIdentifier::parse("1.21.1rc1").unwrap();
        assert_eq!(version, v(1, 21, 1));
        assert_eq!(version.build(), Some("rc1"));

        let version = VersionIdentifier::parse("1.20.6+build.7").unwrap();
        assert_eq!(version, v(1, 20, 6));
        assert_eq!(version.build(), Some("build.7"));

        let version = VersionIdentifier::parse("1.21.3.pre2-SNAPSHOT").unwrap();
        assert_eq!(version, v(1, 21, 3));
        assert_eq!(version.build(), Some("pre2-SNAPSHOT"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        for raw in [
            "1.20.6-R0.1-SNAPSHOT",
            "1.21.1-R0.1-SNAPSHOT",
            "1.21-R0.1-SNAPSHOT",
            "1.21.1rc1",
            "1.22.0",
        ] {
            let first = VersionIdentifier::parse(raw).unwrap();
            let second = VersionIdentifier::parse(&first.to_string()).unwrap();
            assert_eq!(first, second, "{raw}");
            assert_eq!(first.build(), second.build(), "{raw}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(VersionIdentifier::parse(""), Err(ProbeError::Missing { .. })));
        assert!(matches!(VersionIdentifier::parse("   "), Err(ProbeError::Missing { .. })));

        for raw in ["SNAPSHOT", "1", "1..2", "1.2.3.4", "v1.20.6", "99999999999.1.0"] {
            assert!(
                matches!(VersionIdentifier::parse(raw), Err(ProbeError::Malformed { .. })),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn test_build_tag_does_not_affect_ordering() {
        let snapshot = VersionIdentifier::parse("1.21.1-R0.1-SNAPSHOT").unwrap();
        assert_eq!(snapshot, v(1, 21, 1));
        assert!(v(1, 20, 6) < snapshot);
        assert!(snapshot < v(1, 21, 2));
        assert!(v(1, 9, 99) < v(1, 10, 0));
    }

    #[test]
    fn test_from_host_banner() {
        let version = VersionIdentifier::from_host_banner("git-Paper-496 (MC: 1.20.6)").unwrap();
        assert_eq!(version, v(1, 20, 6));

        let version = VersionIdentifier::from_host_banner("1.21.1-R0.1-SNAPSHOT").unwrap();
        assert_eq!(version, v(1, 21, 1));

        assert!(VersionIdentifier::from_host_banner("git-Paper (MC: 1.20.6").is_err());
    }

    #[test]
    fn test_serde_uses_display_form() {
        let version = VersionIdentifier::parse("1.20.6-R0.1-SNAPSHOT").unwrap();
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.20.6-R0.1-SNAPSHOT\"");

        let back: VersionIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back.build(), Some("R0.1-SNAPSHOT"));
    }

    #[test]
    fn test_range_deserialization_is_checked() {
        let range = VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap();
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, r#"{"lower":"1.21.0","upper":{"exclusive":"1.22.0"}}"#);
        let back: VersionRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);

        let inverted = r#"{"lower":"1.22.0","upper":{"inclusive":"1.21.0"}}"#;
        assert!(serde_json::from_str::<VersionRange>(inverted).is_err());
        let empty = r#"{"lower":"1.21.0","upper":{"exclusive":"1.21.0"}}"#;
        assert!(serde_json::from_str::<VersionRange>(empty).is_err());
    }

    #[test]
    fn test_range_contains() {
        let exact = VersionRange::exact(v(1, 20, 6));
        assert!(exact.contains(&v(1, 20, 6)));
        assert!(!exact.contains(&v(1, 20, 5)));
        assert!(!exact.contains(&v(1, 20, 7)));

        let half_open = VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap();
        assert!(half_open.contains(&v(1, 21, 0)));
        assert!(half_open.contains(&v(1, 21, 99)));
        assert!(!half_open.contains(&v(1, 22, 0)));

        let inclusive = VersionRange::inclusive(v(1, 21, 0), v(1, 21, 99)).unwrap();
        assert!(inclusive.contains(&v(1, 21, 99)));
        assert!(!inclusive.contains(&v(1, 22, 0)));
    }

    #[test]
    fn test_range_rejects_empty_bounds() {
        assert!(VersionRange::inclusive(v(1, 21, 0), v(1, 20, 6)).is_err());
        assert!(VersionRange::half_open(v(1, 21, 0), v(1, 21, 0)).is_err());
        assert!(VersionRange::inclusive(v(1, 21, 0), v(1, 21, 0)).is_ok());
    }

    #[test]
    fn test_range_overlaps() {
        let a = VersionRange::inclusive(v(1, 20, 0), v(1, 21, 0)).unwrap();
        let b = VersionRange::inclusive(v(1, 20, 5), v(1, 22, 0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        // Touching at an exclusive bound is not an overlap
        let c = VersionRange::half_open(v(1, 20, 0), v(1, 21, 0)).unwrap();
        let d = VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap();
        assert!(!c.overlaps(&d));
        assert!(!d.overlaps(&c));

        // Nested ranges overlap
        let outer = VersionRange::inclusive(v(1, 0, 0), v(2, 0, 0)).unwrap();
        let inner = VersionRange::exact(v(1, 20, 6));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_range_display() {
        assert_eq!(VersionRange::exact(v(1, 20, 6)).to_string(), "[1.20.6, 1.20.6]");
        assert_eq!(
            VersionRange::half_open(v(1, 21, 0), v(1, 22, 0)).unwrap().to_string(),
            "[1.21.0, 1.22.0)"
        );
    }
}
