//! crates/winperm/src/error.rs
//!
//! Crate-level error taxonomy.
//!
//! The mapping engine itself never fails on well-formed input — unmapped
//! entries degrade to diagnostic mode bits, not errors. Everything here is
//! produced by the collaborators (descriptor store, privilege control,
//! name resolution) and propagated unchanged by the path-level layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by descriptor stores and path-level operations.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The caller lacks rights to the object even after privilege
    /// elevation was attempted.
    #[error("access denied for {}: {detail}", .path.display())]
    AccessDenied {
        /// Object the operation targeted.
        path: PathBuf,
        /// What the store was trying to do.
        detail: String,
    },

    /// The target object does not exist.
    #[error("no such object: {}", .path.display())]
    NotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// A descriptor or identity is malformed, e.g. an unparseable SID.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An access-control entry of a type other than simple allow/deny was
    /// encountered while hydrating an external descriptor. Such entries
    /// must be reported, never silently dropped or guessed at.
    #[error("unsupported access control entry type 0x{ace_type:02x}")]
    UnsupportedEntry {
        /// Raw ACE type byte from the external descriptor.
        ace_type: u8,
    },

    /// An OS-level failure that is neither an access nor an existence
    /// problem, carried verbatim.
    #[error("{action} failed for {}", .path.display())]
    Io {
        /// What the store was doing.
        action: &'static str,
        /// Object the operation targeted.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl SecurityError {
    /// Wraps a raw OS failure for `path` during `action`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
