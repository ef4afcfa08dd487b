use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("malformed version '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

impl VersionError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn input(&self) -> &str {
        match self {
            Self::Malformed { input, .. } => input,
        }
    }
}

/// Numeric ordering key for a dotted version string.
///
/// Anything after the first `-` is a pre-release tag and never takes part in
/// ordering, so `1.2.0-beta` and `1.2.0` produce the same key. A missing
/// fourth component is treated as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: u64,
}

impl VersionKey {
    pub fn new(major: u64, minor: u64, patch: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let numeric = match trimmed.split_once('-') {
            Some((numeric, _prerelease)) => numeric,
            None => trimmed,
        };
        if numeric.is_empty() {
            return Err(VersionError::malformed(input, "no numeric components"));
        }

        let parts: Vec<&str> = numeric.split('.').collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(VersionError::malformed(
                input,
                format!("expected 3 or 4 components, found {}", parts.len()),
            ));
        }

        let mut components = [0_u64; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = parse_component(input, part)?;
        }

        let [major, minor, patch, build] = components;
        Ok(Self::new(major, minor, patch, build))
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

fn parse_component(input: &str, part: &str) -> Result<u64, VersionError> {
    if part.is_empty() {
        return Err(VersionError::malformed(input, "empty component"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::malformed(
            input,
            format!("component '{part}' is not a non-negative integer"),
        ));
    }
    part.parse::<u64>()
        .map_err(|_| VersionError::malformed(input, format!("component '{part}' is out of range")))
}

impl FromStr for VersionKey {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.build != 0 {
            write!(f, ".{}", self.build)?;
        }
        Ok(())
    }
}

pub fn compare_versions(left: &str, right: &str) -> Result<Ordering, VersionError> {
    let left = VersionKey::parse(left)?;
    let right = VersionKey::parse(right)?;
    Ok(left.compare(&right))
}

/// Like [`compare_versions`], but an unparseable pair compares as `Equal`.
/// The parse error is handed back so callers can tell "equal" from
/// "incomparable".
pub fn compare_versions_or_equal(left: &str, right: &str) -> (Ordering, Option<VersionError>) {
    match compare_versions(left, right) {
        Ok(ordering) => (ordering, None),
        Err(err) => (Ordering::Equal, Some(err)),
    }
}

pub fn is_prerelease(version: &str) -> bool {
    version.trim().contains('-')
}
