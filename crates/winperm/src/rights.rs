//! crates/winperm/src/rights.rs
//!
//! Win32 access-right bit values used by the mapping engine.
//!
//! These mirror the constants in `winnt.h`. They are deliberately kept as
//! plain constants in one module: the exact composition of the "standard"
//! baseline rights folded into every synthesized allow mask is OS-version
//! sensitive, so the algorithm in [`crate::mapping`] refers to these names
//! only and this module is the single place to adjust the bit values.

/// Delete the object itself.
pub const DELETE: u32 = 0x0001_0000;
/// Read the security descriptor (not the data).
pub const READ_CONTROL: u32 = 0x0002_0000;
/// Modify the DACL.
pub const WRITE_DAC: u32 = 0x0004_0000;
/// Take or assign ownership.
pub const WRITE_OWNER: u32 = 0x0008_0000;
/// Wait on the object handle.
pub const SYNCHRONIZE: u32 = 0x0010_0000;

/// All standard rights: `DELETE` through `SYNCHRONIZE`.
pub const STANDARD_RIGHTS_ALL: u32 = 0x001F_0000;
/// Standard rights implied by generic read (READ_CONTROL only).
pub const STANDARD_RIGHTS_READ: u32 = READ_CONTROL;
/// Standard rights implied by generic write (READ_CONTROL only).
pub const STANDARD_RIGHTS_WRITE: u32 = READ_CONTROL;
/// Standard rights implied by generic execute (READ_CONTROL only).
pub const STANDARD_RIGHTS_EXECUTE: u32 = READ_CONTROL;
/// The object-specific low word, all bits set.
pub const SPECIFIC_RIGHTS_ALL: u32 = 0x0000_FFFF;

/// Read file data / list directory.
pub const FILE_READ_DATA: u32 = 0x0001;
/// Write file data / create files in a directory.
pub const FILE_WRITE_DATA: u32 = 0x0002;
/// Append file data / create subdirectories.
pub const FILE_APPEND_DATA: u32 = 0x0004;
/// Read extended attributes.
pub const FILE_READ_EA: u32 = 0x0008;
/// Write extended attributes.
pub const FILE_WRITE_EA: u32 = 0x0010;
/// Execute file / traverse directory.
pub const FILE_EXECUTE: u32 = 0x0020;
/// Delete a child of a directory, regardless of the child's own DACL.
pub const FILE_DELETE_CHILD: u32 = 0x0040;
/// Read basic file attributes.
pub const FILE_READ_ATTRIBUTES: u32 = 0x0080;
/// Write basic file attributes.
pub const FILE_WRITE_ATTRIBUTES: u32 = 0x0100;

/// The composite generic-read right for files.
pub const FILE_GENERIC_READ: u32 =
    STANDARD_RIGHTS_READ | FILE_READ_DATA | FILE_READ_ATTRIBUTES | FILE_READ_EA | SYNCHRONIZE;

/// The composite generic-write right for files.
pub const FILE_GENERIC_WRITE: u32 = STANDARD_RIGHTS_WRITE
    | FILE_WRITE_DATA
    | FILE_WRITE_ATTRIBUTES
    | FILE_WRITE_EA
    | FILE_APPEND_DATA
    | SYNCHRONIZE;

/// The composite generic-execute right for files.
pub const FILE_GENERIC_EXECUTE: u32 =
    STANDARD_RIGHTS_EXECUTE | FILE_READ_ATTRIBUTES | FILE_EXECUTE | SYNCHRONIZE;

/// Everything: all standard and all object-specific rights.
pub const FULL_CONTROL: u32 = STANDARD_RIGHTS_ALL | SPECIFIC_RIGHTS_ALL;
