//! Extension version strings
//!
//! Browser extension stores do not use SemVer. A version is 1 to 4
//! dot-separated integers in `0..=65535`, not all zero, and non-zero parts
//! may not carry leading zeros. Missing trailing parts compare as `0`, so
//! `1.0` and `1.0.0` are the same version.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Maximum number of dot-separated parts
pub const MAX_PARTS: usize = 4;

/// Reasons a version string is rejected, in the order they are checked
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("must have 1 to 4 dot-separated parts (found {0})")]
    PartCount(usize),

    #[error("part \"{0}\" is not a non-negative integer")]
    NotAnInteger(String),

    #[error("part \"{0}\" is out of range 0-65535")]
    OutOfRange(String),

    #[error("part \"{0}\" has a leading zero")]
    LeadingZero(String),

    #[error("must not be all zeros")]
    AllZero,
}

/// A parsed extension version
///
/// The original text is kept so a version is written back exactly as the
/// user spelled it.
#[derive(Debug, Clone)]
pub struct ExtensionVersion {
    raw: String,
    parts: Vec<u16>,
}

impl ExtensionVersion {
    /// Parse a version string, reporting only the first rule it breaks
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let segments: Vec<&str> = input.split('.').collect();

        if segments.len() > MAX_PARTS {
            return Err(VersionError::PartCount(segments.len()));
        }

        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(VersionError::NotAnInteger(bad.to_string()));
        }

        let mut parts = Vec::with_capacity(segments.len());
        for segment in &segments {
            // Digits only at this point, so a parse failure means overflow.
            let value = segment
                .parse::<u16>()
                .map_err(|_| VersionError::OutOfRange(segment.to_string()))?;
            parts.push(value);
        }

        if let Some((segment, _)) = segments
            .iter()
            .zip(&parts)
            .find(|(s, v)| **v != 0 && s.starts_with('0'))
        {
            return Err(VersionError::LeadingZero(segment.to_string()));
        }

        if parts.iter().all(|p| *p == 0) {
            return Err(VersionError::AllZero);
        }

        Ok(Self {
            raw: input.to_string(),
            parts,
        })
    }

    /// The version exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric parts, without padding
    pub fn parts(&self) -> &[u16] {
        &self.parts
    }

    /// Version with dots replaced by dashes, as used in archive names
    #[must_use]
    pub fn dashed(&self) -> String {
        self.raw.replace('.', "-")
    }

    fn part(&self, index: usize) -> u16 {
        self.parts.get(index).copied().unwrap_or(0)
    }
}

/// Compare two versions part by part, padding the shorter with zeros
pub fn compare_versions(a: &ExtensionVersion, b: &ExtensionVersion) -> Ordering {
    (0..MAX_PARTS)
        .map(|i| a.part(i).cmp(&b.part(i)))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl Ord for ExtensionVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(self, other)
    }
}

impl PartialOrd for ExtensionVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ExtensionVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ExtensionVersion {}

impl FromStr for ExtensionVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
