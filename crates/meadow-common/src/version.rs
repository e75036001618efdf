//! Save format versioning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version stamped into every save snapshot.
///
/// Readers accept any snapshot with the same major version; minor and patch
/// bumps only add fields that have serde defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when old readers can no longer load the snapshot
    pub major: u16,
    /// Bumped for additive fields
    pub minor: u16,
    /// Bumped for fixes that keep the layout
    pub patch: u16,
}

impl SchemaVersion {
    /// A version triple.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Version written by this build.
    pub const SAVE_SNAPSHOT: Self = Self::new(1, 0, 0);

    /// Whether a reader at this version can load a snapshot stamped `found`.
    #[must_use]
    pub const fn can_read(&self, found: &Self) -> bool {
        self.major == found.major
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::SAVE_SNAPSHOT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Leading bytes that identify a binary save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicBytes(pub [u8; 4]);

impl MagicBytes {
    /// Binary snapshot files.
    pub const SAVE: Self = Self(*b"MDSV");

    /// Whether `bytes` begins with this tag.
    #[must_use]
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.0)
    }
}
