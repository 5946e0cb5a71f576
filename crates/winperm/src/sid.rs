//! crates/winperm/src/sid.rs
//!
//! Security identifiers in canonical string form.
//!
//! The mapping engine never resolves accounts; it only compares and stores
//! identities. A [`Sid`] is therefore an opaque value type wrapping the
//! canonical `S-R-I-S...` string representation, e.g. `"S-1-5-32-544"`.
//! The handful of well-known principals the engine depends on are fixed
//! constants, not runtime lookups.

use std::fmt;

use crate::error::SecurityError;

/// The world/Everyone principal, mapped to the POSIX "other" class.
pub const EVERYONE: &str = "S-1-1-0";

/// The Nobody principal. Never used for real access; an allow entry for
/// Nobody carrying `FILE_APPEND_DATA` marks the sticky bit.
pub const NOBODY: &str = "S-1-0-0";

/// The LocalSystem account. Every DACL this engine synthesizes carries an
/// entry for it; its absence is reported as an anomaly when reading.
pub const LOCAL_SYSTEM: &str = "S-1-5-18";

/// Placeholder principal for inheritable directory templates: replaced by
/// the owner of a newly created child.
pub const CREATOR_OWNER: &str = "S-1-3-0";

/// Placeholder principal for inheritable directory templates: replaced by
/// the primary group of a newly created child.
pub const CREATOR_GROUP: &str = "S-1-3-1";

/// An OS-level security identity in canonical string form.
///
/// Equality is plain value equality on the canonical string; the engine
/// never mutates a `Sid` after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sid(String);

impl Sid {
    /// Wraps an already-canonical SID string without validation.
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    /// Parses and validates a canonical SID string.
    ///
    /// Accepts the `S-<revision>-<authority>[-<subauthority>...]` shape and
    /// nothing else. Hydration layers use this to reject corrupt identities
    /// before they reach the mapping engine.
    pub fn parse(s: &str) -> Result<Self, SecurityError> {
        let invalid = || SecurityError::InvalidState(format!("malformed SID string: {s:?}"));

        let rest = s.strip_prefix("S-").ok_or_else(invalid)?;
        let mut parts = rest.split('-');

        // revision and identifier authority are mandatory
        let revision = parts.next().ok_or_else(invalid)?;
        let authority = parts.next().ok_or_else(invalid)?;
        if revision.parse::<u8>().is_err() || authority.parse::<u64>().is_err() {
            return Err(invalid());
        }

        for sub in parts {
            if sub.parse::<u32>().is_err() {
                return Err(invalid());
            }
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a well-known SID string constant.
    #[must_use]
    pub fn is(&self, well_known: &str) -> bool {
        self.0 == well_known
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Returns the Everyone principal.
#[must_use]
pub fn everyone() -> Sid {
    Sid::new(EVERYONE)
}

/// Returns the Nobody sticky-bit marker principal.
#[must_use]
pub fn nobody() -> Sid {
    Sid::new(NOBODY)
}

/// Returns the LocalSystem principal.
#[must_use]
pub fn local_system() -> Sid {
    Sid::new(LOCAL_SYSTEM)
}

/// Returns the CreatorOwner template principal.
#[must_use]
pub fn creator_owner() -> Sid {
    Sid::new(CREATOR_OWNER)
}

/// Returns the CreatorGroup template principal.
#[must_use]
pub fn creator_group() -> Sid {
    Sid::new(CREATOR_GROUP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_forms() {
        assert_eq!(Sid::parse("S-1-1-0").unwrap(), everyone());
        assert_eq!(Sid::parse("S-1-5-18").unwrap(), local_system());
        assert!(Sid::parse("S-1-5-21-3623811015-3361044348-30300820-1013").is_ok());
        // revision and authority alone are a valid (if unusual) SID
        assert!(Sid::parse("S-1-5").is_ok());
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "S-", "S-1-", "Everyone", "S-1-5-x", "s-1-5-18", "S--5-18"] {
            let err = Sid::parse(input).unwrap_err();
            assert!(matches!(err, SecurityError::InvalidState(_)), "{input:?}");
        }
    }

    #[test]
    fn well_known_comparisons() {
        assert!(everyone().is(EVERYONE));
        assert!(!nobody().is(LOCAL_SYSTEM));
        assert_eq!(local_system().to_string(), "S-1-5-18");
    }
}
