//! Account identifiers.
//!
//! Identifiers are UUIDv4 in canonical form: 32 lowercase hex characters without hyphens.
//! Profile documents are stored under a sharded directory derived from the identifier so
//! that no single directory grows without bound.

use crate::{PortalError, PortalResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(Uuid);

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl UserId {
    /// Allocate a fresh identifier for a new account.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Accept an identifier that is already canonical.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised, so one account
    /// can never map to two storage paths.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::InvalidInput` if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> PortalResult<Self> {
        if !Self::is_canonical(input) {
            return Err(PortalError::InvalidInput(format!(
                "user id must be 32 lowercase hex characters, got: '{input}'"
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| PortalError::InvalidInput(e.to_string()))
    }

    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// `parent_dir/<s1>/<s2>/<id>/`, where `s1` and `s2` are the first two pairs of hex
    /// characters.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for UserId {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::parse(s)
    }
}
