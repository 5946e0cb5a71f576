//! crates/winperm/src/mode.rs
//!
//! POSIX mode bits, plus two engine-private diagnostic bits that are
//! reported by [`mode_of`](crate::mapping::mode_of) but never written back
//! to the OS.

use std::fmt;

/// Owner read.
pub const S_IRUSR: u32 = 0o400;
/// Owner write.
pub const S_IWUSR: u32 = 0o200;
/// Owner execute.
pub const S_IXUSR: u32 = 0o100;
/// Group read.
pub const S_IRGRP: u32 = 0o040;
/// Group write.
pub const S_IWGRP: u32 = 0o020;
/// Group execute.
pub const S_IXGRP: u32 = 0o010;
/// Other read.
pub const S_IROTH: u32 = 0o004;
/// Other write.
pub const S_IWOTH: u32 = 0o002;
/// Other execute.
pub const S_IXOTH: u32 = 0o001;
/// All owner permission bits.
pub const S_IRWXU: u32 = 0o700;
/// All group permission bits.
pub const S_IRWXG: u32 = 0o070;
/// All other permission bits.
pub const S_IRWXO: u32 = 0o007;
/// Sticky bit: restricts child deletion within a directory.
pub const S_ISVTX: u32 = 0o1000;

/// Diagnostic: at least one entry could not be attributed to the owner,
/// group, other, or system classes.
pub const S_IEXTRA: u32 = 0o2000000;
/// Diagnostic: the DACL carries no LocalSystem entry at all.
pub const S_ISYSTEM_MISSING: u32 = 0o4000000;

/// A POSIX-style mode value.
///
/// The low twelve bits are the familiar permission and sticky bits; the
/// diagnostic bits above may appear in values returned by the mapping
/// engine and are ignored by everything that writes to the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    /// Wraps a raw mode value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value, diagnostic bits included.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns only the permission and sticky bits.
    #[must_use]
    pub const fn permissions(self) -> u32 {
        self.0 & (S_IRWXU | S_IRWXG | S_IRWXO | S_ISVTX)
    }

    /// Checks whether all bits of `bits` are set.
    #[must_use]
    pub const fn contains(self, bits: u32) -> bool {
        (self.0 & bits) == bits
    }

    /// True when the sticky bit is set.
    #[must_use]
    pub const fn sticky(self) -> bool {
        self.contains(S_ISVTX)
    }

    /// True when an unattributable entry was seen while reading.
    #[must_use]
    pub const fn has_extra_aces(self) -> bool {
        self.contains(S_IEXTRA)
    }

    /// True when no LocalSystem entry was seen while reading.
    #[must_use]
    pub const fn system_missing(self) -> bool {
        self.contains(S_ISYSTEM_MISSING)
    }

    /// True when any class is granted the write bit.
    #[must_use]
    pub const fn grants_write(self) -> bool {
        (self.0 & (S_IWUSR | S_IWGRP | S_IWOTH)) != 0
    }
}

impl From<u32> for Mode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.permissions())
    }
}
