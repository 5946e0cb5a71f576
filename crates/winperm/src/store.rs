//! crates/winperm/src/store.rs
//!
//! Collaborator contracts for the OS-facing side of the system.
//!
//! The core is purely computational; fetching and installing descriptors,
//! answering directory queries, clearing attributes, and resolving
//! account names are all behind these traits. The Win32-backed
//! implementations live in [`crate::store_win`]; tests substitute an
//! in-memory store.

use std::path::Path;

use crate::descriptor::SecurityDescriptor;
use crate::error::SecurityError;
use crate::sid::Sid;

/// Reads and writes native security descriptors for filesystem objects.
pub trait SecurityStore {
    /// Fetches the owner, group, DACL, and protection flag for `path`.
    ///
    /// Fails with [`SecurityError::AccessDenied`] when the caller lacks
    /// rights even after privilege elevation, or
    /// [`SecurityError::NotFound`] when the path does not resolve.
    fn read_descriptor(&self, path: &Path) -> Result<SecurityDescriptor, SecurityError>;

    /// Installs `descriptor` on `path`. Owner, group, DACL, and the
    /// protection flag are applied atomically from the caller's
    /// perspective.
    fn write_descriptor(
        &self,
        path: &Path,
        descriptor: &SecurityDescriptor,
    ) -> Result<(), SecurityError>;

    /// True when `path` names a directory.
    fn is_directory(&self, path: &Path) -> Result<bool, SecurityError>;

    /// Clears the read-only attribute on `path`. Best-effort: a failure
    /// here must not abort a mode change that does not actually require
    /// the write bit.
    fn clear_readonly(&self, path: &Path) -> Result<(), SecurityError>;
}

/// Resolves human-facing account names to and from identities.
///
/// Never consulted by the mapping engine itself — callers presenting
/// display names use it before handing a [`Sid`] in. An unknown account
/// is an expected absence, not a failure, hence the `Option` in the
/// success variant.
pub trait NameResolver {
    /// Looks up the SID for an account name, `Ok(None)` when no such
    /// account exists.
    fn resolve_name(&self, name: &str) -> Result<Option<Sid>, SecurityError>;

    /// Looks up the display name for a SID, `Ok(None)` when the identity
    /// maps to no known account.
    fn display_name(&self, sid: &Sid) -> Result<Option<String>, SecurityError>;
}
