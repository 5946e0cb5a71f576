//! crates/winperm/src/security.rs
//!
//! Path-level operations: the surface a configuration-management caller
//! uses to query and enforce POSIX modes, owners, and groups on Windows
//! filesystem objects.
//!
//! Each operation is a single read or read-modify-write against the
//! [`SecurityStore`]; no atomicity is claimed across the two halves of a
//! read-modify-write cycle. Concurrent operations on distinct paths are
//! independent; conflicts on the same path are the store's concern.

use std::path::Path;

use tracing::debug;

use crate::ace::Ace;
use crate::descriptor::SecurityDescriptor;
use crate::error::SecurityError;
use crate::mapping;
use crate::mode::Mode;
use crate::sid::{self, Sid};
use crate::store::SecurityStore;

/// A descriptor read from the store together with the mode derived from
/// it, so callers get both views of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityInfo {
    /// The descriptor as the store returned it.
    pub descriptor: SecurityDescriptor,
    /// The POSIX approximation, diagnostic bits included.
    pub mode: Mode,
}

/// Queries and enforces POSIX-style security on paths through a
/// [`SecurityStore`].
#[derive(Debug)]
pub struct FileSecurity<S> {
    store: S,
}

impl<S: SecurityStore> FileSecurity<S> {
    /// Wraps a descriptor store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the owner of `path`.
    pub fn owner(&self, path: &Path) -> Result<Sid, SecurityError> {
        Ok(self.store.read_descriptor(path)?.owner().clone())
    }

    /// Returns the group of `path`.
    pub fn group(&self, path: &Path) -> Result<Sid, SecurityError> {
        Ok(self.store.read_descriptor(path)?.group().clone())
    }

    /// Returns the POSIX mode of `path`, diagnostic bits included.
    pub fn mode(&self, path: &Path) -> Result<Mode, SecurityError> {
        Ok(self.info(path)?.mode)
    }

    /// Returns the descriptor of `path` together with its derived mode.
    pub fn info(&self, path: &Path) -> Result<SecurityInfo, SecurityError> {
        let descriptor = self.store.read_descriptor(path)?;
        let mode = mapping::mode_of(&descriptor, self.store.is_directory(path)?);
        Ok(SecurityInfo { descriptor, mode })
    }

    /// Returns the access-control entries on `path` that apply to `sid`.
    pub fn aces_for(&self, path: &Path, sid: &Sid) -> Result<Vec<Ace>, SecurityError> {
        let descriptor = self.store.read_descriptor(path)?;
        Ok(descriptor.dacl().aces_for(sid).cloned().collect())
    }

    /// Makes `owner` the owner of `path`, re-pointing DACL entries that
    /// referenced the previous owner. No-op when unchanged.
    pub fn set_owner(&self, path: &Path, owner: Sid) -> Result<(), SecurityError> {
        let mut descriptor = self.store.read_descriptor(path)?;
        if *descriptor.owner() == owner {
            return Ok(());
        }
        debug!(path = %path.display(), %owner, "changing owner");
        descriptor.set_owner(owner);
        self.store.write_descriptor(path, &descriptor)
    }

    /// Makes `group` the group of `path`, re-pointing DACL entries that
    /// referenced the previous group. No-op when unchanged.
    pub fn set_group(&self, path: &Path, group: Sid) -> Result<(), SecurityError> {
        let mut descriptor = self.store.read_descriptor(path)?;
        if *descriptor.group() == group {
            return Ok(());
        }
        debug!(path = %path.display(), %group, "changing group");
        descriptor.set_group(group);
        self.store.write_descriptor(path, &descriptor)
    }

    /// Enforces `mode` on `path`, keeping the existing owner and group.
    /// The installed descriptor is protected: it no longer inherits
    /// entries from its parent container.
    pub fn set_mode(&self, path: &Path, mode: Mode) -> Result<(), SecurityError> {
        self.apply_mode(path, mode, true)
    }

    /// Like [`FileSecurity::set_mode`] but leaves the descriptor open to
    /// parent inheritance.
    pub fn set_mode_unprotected(&self, path: &Path, mode: Mode) -> Result<(), SecurityError> {
        self.apply_mode(path, mode, false)
    }

    fn apply_mode(&self, path: &Path, mode: Mode, protect: bool) -> Result<(), SecurityError> {
        let existing = self.store.read_descriptor(path)?;
        let is_directory = self.store.is_directory(path)?;

        // preserve a caller-managed SYSTEM mask only when SYSTEM holds the
        // object; everything else gets the canonical full-control entry
        let system = sid::local_system();
        let system_mask = if existing.owner().is(sid::LOCAL_SYSTEM)
            || existing.group().is(sid::LOCAL_SYSTEM)
        {
            existing.dacl().mask_for(&system)
        } else {
            None
        };

        let descriptor = mapping::descriptor_for(
            mode,
            existing.owner(),
            existing.group(),
            is_directory,
            system_mask,
            protect,
        );

        // a read-only attribute would trump the new DACL's write grants
        if mapping::allows_write(&descriptor) {
            self.store.clear_readonly(path)?;
        }

        debug!(path = %path.display(), %mode, protect, "installing descriptor");
        self.store.write_descriptor(path, &descriptor)
    }
}
