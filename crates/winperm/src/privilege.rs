//! crates/winperm/src/privilege.rs
//!
//! Scoped privilege elevation.
//!
//! Reading or writing a descriptor on an object the caller does not own
//! requires backup/restore privileges, and leaving one enabled past the
//! single operation that needed it is a security liability. The helper
//! here brackets exactly one operation: enable, run, disable on every
//! exit path. Nested scopes with different privileges compose; the inner
//! scope's release does not touch the outer scope's privilege.

use tracing::warn;

use crate::error::SecurityError;

/// Token privilege required to read descriptors on objects the caller
/// cannot otherwise access.
pub const SE_BACKUP_NAME: &str = "SeBackupPrivilege";

/// Token privilege required to write descriptors and take ownership.
pub const SE_RESTORE_NAME: &str = "SeRestorePrivilege";

/// Enables and disables named token privileges on the current process.
///
/// Enabling never grants a privilege the token does not hold; it only
/// toggles ones that are present but disabled.
pub trait PrivilegeOps {
    /// Enables (`true`) or disables (`false`) the named privilege.
    fn set_privilege(&self, name: &str, enable: bool) -> Result<(), SecurityError>;
}

/// Runs `op` with the named privilege enabled, disabling it again on
/// every exit path.
///
/// A failure to re-disable during unwind is logged rather than masking
/// the operation's own error.
pub fn with_privilege<P, T, F>(ops: &P, name: &str, op: F) -> Result<T, SecurityError>
where
    P: PrivilegeOps + ?Sized,
    F: FnOnce() -> Result<T, SecurityError>,
{
    ops.set_privilege(name, true)?;
    let guard = PrivilegeGuard { ops, name };
    let result = op();
    drop(guard);
    result
}

struct PrivilegeGuard<'a, P: PrivilegeOps + ?Sized> {
    ops: &'a P,
    name: &'a str,
}

impl<P: PrivilegeOps + ?Sized> Drop for PrivilegeGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(error) = self.ops.set_privilege(self.name, false) {
            warn!(privilege = self.name, %error, "failed to drop privilege");
        }
    }
}
