//! Shared test fixtures for the winperm workspace.
//!
//! [`MemoryStore`] is an in-memory [`SecurityStore`] keyed by path, with
//! injectable access-denied and not-found behavior, so integration tests
//! can exercise the path-level flows without touching a real filesystem.
//! [`RecordingPrivileges`] logs every enable/disable for asserting the
//! privilege bracket.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use winperm::error::SecurityError;
use winperm::privilege::PrivilegeOps;
use winperm::store::SecurityStore;
use winperm::SecurityDescriptor;

#[derive(Debug, Clone)]
struct Object {
    descriptor: SecurityDescriptor,
    directory: bool,
    readonly: bool,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<PathBuf, Object>,
    denied: HashSet<PathBuf>,
    readonly_failures: HashSet<PathBuf>,
    writes: Vec<PathBuf>,
}

/// An in-memory descriptor store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file at `path` with the given descriptor.
    pub fn insert_file(&self, path: impl Into<PathBuf>, descriptor: SecurityDescriptor) {
        self.insert(path.into(), descriptor, false);
    }

    /// Registers a directory at `path` with the given descriptor.
    pub fn insert_dir(&self, path: impl Into<PathBuf>, descriptor: SecurityDescriptor) {
        self.insert(path.into(), descriptor, true);
    }

    fn insert(&self, path: PathBuf, descriptor: SecurityDescriptor, directory: bool) {
        self.inner.lock().unwrap().objects.insert(
            path,
            Object {
                descriptor,
                directory,
                readonly: false,
            },
        );
    }

    /// Marks `path` read-only.
    pub fn set_readonly(&self, path: impl AsRef<Path>) {
        if let Some(object) = self
            .inner
            .lock()
            .unwrap()
            .objects
            .get_mut(path.as_ref())
        {
            object.readonly = true;
        }
    }

    /// Makes every operation on `path` fail with access denied.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.inner.lock().unwrap().denied.insert(path.into());
    }

    /// Makes `clear_readonly` fail for `path` while leaving other
    /// operations untouched.
    pub fn fail_readonly_clear(&self, path: impl Into<PathBuf>) {
        self.inner
            .lock()
            .unwrap()
            .readonly_failures
            .insert(path.into());
    }

    /// Returns the stored descriptor for `path`, if any.
    #[must_use]
    pub fn descriptor(&self, path: impl AsRef<Path>) -> Option<SecurityDescriptor> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(path.as_ref())
            .map(|object| object.descriptor.clone())
    }

    /// True when `path` still carries the read-only attribute.
    #[must_use]
    pub fn readonly(&self, path: impl AsRef<Path>) -> bool {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(path.as_ref())
            .is_some_and(|object| object.readonly)
    }

    /// The paths written so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().writes.clone()
    }

    fn check_access(inner: &Inner, path: &Path) -> Result<(), SecurityError> {
        if inner.denied.contains(path) {
            return Err(SecurityError::AccessDenied {
                path: path.into(),
                detail: "injected".into(),
            });
        }
        Ok(())
    }
}

impl SecurityStore for MemoryStore {
    fn read_descriptor(&self, path: &Path) -> Result<SecurityDescriptor, SecurityError> {
        let inner = self.inner.lock().unwrap();
        Self::check_access(&inner, path)?;
        inner
            .objects
            .get(path)
            .map(|object| object.descriptor.clone())
            .ok_or_else(|| SecurityError::NotFound { path: path.into() })
    }

    fn write_descriptor(
        &self,
        path: &Path,
        descriptor: &SecurityDescriptor,
    ) -> Result<(), SecurityError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_access(&inner, path)?;
        let object = inner
            .objects
            .get_mut(path)
            .ok_or_else(|| SecurityError::NotFound { path: path.into() })?;
        object.descriptor = descriptor.clone();
        inner.writes.push(path.into());
        Ok(())
    }

    fn is_directory(&self, path: &Path) -> Result<bool, SecurityError> {
        let inner = self.inner.lock().unwrap();
        Self::check_access(&inner, path)?;
        inner
            .objects
            .get(path)
            .map(|object| object.directory)
            .ok_or_else(|| SecurityError::NotFound { path: path.into() })
    }

    fn clear_readonly(&self, path: &Path) -> Result<(), SecurityError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_access(&inner, path)?;
        if inner.readonly_failures.contains(path) {
            return Err(SecurityError::io(
                "clear read-only attribute",
                path,
                std::io::Error::other("injected"),
            ));
        }
        let object = inner
            .objects
            .get_mut(path)
            .ok_or_else(|| SecurityError::NotFound { path: path.into() })?;
        object.readonly = false;
        Ok(())
    }
}

/// Records privilege toggles in order.
#[derive(Debug, Default)]
pub struct RecordingPrivileges {
    log: Mutex<Vec<(String, bool)>>,
}

impl RecordingPrivileges {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The toggles observed so far, in order.
    #[must_use]
    pub fn log(&self) -> Vec<(String, bool)> {
        self.log.lock().unwrap().clone()
    }
}

impl PrivilegeOps for RecordingPrivileges {
    fn set_privilege(&self, name: &str, enable: bool) -> Result<(), SecurityError> {
        self.log.lock().unwrap().push((name.to_owned(), enable));
        Ok(())
    }
}
