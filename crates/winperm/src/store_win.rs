#![cfg(windows)]
#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]

//! crates/winperm/src/store_win.rs
//!
//! Win32-backed implementations of the collaborator traits.
//!
//! Descriptor access follows the classic sequence: open the object with
//! `FILE_FLAG_BACKUP_SEMANTICS` (required for directories and for the
//! backup privilege to take effect), query or install the security
//! information on the handle, close. Reads run under `SeBackupPrivilege`;
//! writes additionally hold `SeRestorePrivilege`. Both privileges are
//! released on every exit path via [`with_privilege`].

use std::ffi::c_void;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use windows::Win32::Foundation::{
    CloseHandle, GetLastError, LocalFree, ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND,
    ERROR_PATH_NOT_FOUND, ERROR_SUCCESS, HANDLE, HLOCAL,
};
use windows::Win32::Security::Authorization::{
    ConvertSidToStringSidW, ConvertStringSidToSidW, GetSecurityInfo, SetSecurityInfo,
    SE_FILE_OBJECT,
};
use windows::Win32::Security::{
    AddAccessAllowedAceEx, AddAccessDeniedAceEx, AdjustTokenPrivileges, GetAce, InitializeAcl,
    LookupPrivilegeValueW, ACCESS_ALLOWED_ACE, ACE_FLAGS, ACE_HEADER, ACL, ACL_REVISION,
    DACL_SECURITY_INFORMATION, GROUP_SECURITY_INFORMATION, LUID, OWNER_SECURITY_INFORMATION,
    PROTECTED_DACL_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID,
    SECURITY_DESCRIPTOR_CONTROL, SE_DACL_PROTECTED, SE_PRIVILEGE_ENABLED, TOKEN_ADJUST_PRIVILEGES,
    TOKEN_PRIVILEGES, TOKEN_QUERY, UNPROTECTED_DACL_SECURITY_INFORMATION,
};
use windows::Win32::Security::GetSecurityDescriptorControl;
use windows::Win32::Storage::FileSystem::{
    CreateFileW, GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_READONLY, FILE_FLAGS_AND_ATTRIBUTES, FILE_FLAG_BACKUP_SEMANTICS,
    FILE_SHARE_READ, FILE_SHARE_WRITE, INVALID_FILE_ATTRIBUTES, OPEN_EXISTING, READ_CONTROL,
    WRITE_DAC, WRITE_OWNER,
};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};
use windows::core::{PCWSTR, PWSTR};

use crate::ace::{Ace, AceFlags, AceKind};
use crate::acl::Acl;
use crate::descriptor::SecurityDescriptor;
use crate::error::SecurityError;
use crate::privilege::{with_privilege, PrivilegeOps, SE_BACKUP_NAME, SE_RESTORE_NAME};
use crate::sid::Sid;
use crate::store::SecurityStore;

const ACCESS_ALLOWED_ACE_TYPE: u8 = 0x0;
const ACCESS_DENIED_ACE_TYPE: u8 = 0x1;

// An ACL header is 8 bytes and each allow/deny ACE is its header, a mask,
// and an inline SID. 64 KiB is the OS-imposed ceiling for an ACL.
const ACL_BUFFER_LEN: usize = 0x10000;

/// Adjusts token privileges on the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessPrivileges;

impl PrivilegeOps for ProcessPrivileges {
    fn set_privilege(&self, name: &str, enable: bool) -> Result<(), SecurityError> {
        let wide_name: Vec<u16> = name.encode_utf16().chain(Some(0)).collect();
        let mut luid = LUID::default();
        // Safety: wide_name is NUL terminated and outlives the call.
        unsafe { LookupPrivilegeValueW(PCWSTR::null(), PCWSTR(wide_name.as_ptr()), &mut luid) }
            .map_err(|e| SecurityError::io("lookup privilege", name, win_io(&e)))?;

        let mut token = HANDLE::default();
        // Safety: the process pseudo-handle needs no closing; the token does.
        unsafe {
            OpenProcessToken(
                GetCurrentProcess(),
                TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY,
                &mut token,
            )
        }
        .map_err(|e| SecurityError::io("open process token", name, win_io(&e)))?;
        let token = HandleGuard(token);

        let mut state = TOKEN_PRIVILEGES::default();
        state.PrivilegeCount = 1;
        state.Privileges[0].Luid = luid;
        state.Privileges[0].Attributes = if enable {
            SE_PRIVILEGE_ENABLED
        } else {
            Default::default()
        };

        // Safety: state is a fully initialized TOKEN_PRIVILEGES value.
        unsafe { AdjustTokenPrivileges(token.0, false, Some(&state), 0, None, None) }
            .map_err(|e| SecurityError::io("adjust privileges", name, win_io(&e)))
    }
}

/// [`SecurityStore`] over the Win32 object security APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32SecurityStore {
    privileges: ProcessPrivileges,
}

impl Win32SecurityStore {
    /// Creates a store operating on the current process token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecurityStore for Win32SecurityStore {
    fn read_descriptor(&self, path: &Path) -> Result<SecurityDescriptor, SecurityError> {
        with_privilege(&self.privileges, SE_BACKUP_NAME, || {
            let handle = open_object(path, READ_CONTROL.0)?;

            let mut owner = PSID::default();
            let mut group = PSID::default();
            let mut dacl: *mut ACL = ptr::null_mut();
            let mut sd = PSECURITY_DESCRIPTOR::default();

            // Safety: out pointers live for the duration of the call; the
            // returned descriptor owns the SID/ACL memory and is freed below.
            let status = unsafe {
                GetSecurityInfo(
                    handle.0,
                    SE_FILE_OBJECT,
                    OWNER_SECURITY_INFORMATION
                        | GROUP_SECURITY_INFORMATION
                        | DACL_SECURITY_INFORMATION,
                    Some(&mut owner),
                    Some(&mut group),
                    Some(&mut dacl),
                    None,
                    Some(&mut sd),
                )
            };
            if status != ERROR_SUCCESS {
                return Err(os_error(path, "query security info", status.0));
            }
            let sd = LocalGuard(HLOCAL(sd.0));

            let owner = sid_from_ptr(path, owner)?;
            let group = sid_from_ptr(path, group)?;
            let acl = parse_dacl(path, dacl)?;
            let protect = descriptor_protected(path, PSECURITY_DESCRIPTOR(sd.0 .0))?;

            Ok(SecurityDescriptor::new(owner, group, acl, protect))
        })
    }

    fn write_descriptor(
        &self,
        path: &Path,
        descriptor: &SecurityDescriptor,
    ) -> Result<(), SecurityError> {
        with_privilege(&self.privileges, SE_BACKUP_NAME, || {
            with_privilege(&self.privileges, SE_RESTORE_NAME, || {
                let handle =
                    open_object(path, READ_CONTROL.0 | WRITE_DAC.0 | WRITE_OWNER.0)?;

                let owner = LocalSid::from_sid(path, descriptor.owner())?;
                let group = LocalSid::from_sid(path, descriptor.group())?;
                let mut acl_buf = build_dacl(path, descriptor.dacl())?;

                let protection = if descriptor.protect() {
                    PROTECTED_DACL_SECURITY_INFORMATION
                } else {
                    UNPROTECTED_DACL_SECURITY_INFORMATION
                };

                // Safety: the SID and ACL buffers stay alive until the call
                // returns; SetSecurityInfo copies what it needs.
                let status = unsafe {
                    SetSecurityInfo(
                        handle.0,
                        SE_FILE_OBJECT,
                        OWNER_SECURITY_INFORMATION
                            | GROUP_SECURITY_INFORMATION
                            | DACL_SECURITY_INFORMATION
                            | protection,
                        Some(owner.as_psid()),
                        Some(group.as_psid()),
                        Some(acl_buf.as_mut_ptr().cast::<ACL>()),
                        None,
                    )
                };
                if status != ERROR_SUCCESS {
                    return Err(os_error(path, "set security info", status.0));
                }
                Ok(())
            })
        })
    }

    fn is_directory(&self, path: &Path) -> Result<bool, SecurityError> {
        let attributes = attributes_of(path)?;
        Ok((attributes & FILE_ATTRIBUTE_DIRECTORY.0) != 0)
    }

    fn clear_readonly(&self, path: &Path) -> Result<(), SecurityError> {
        let attributes = attributes_of(path)?;
        if (attributes & FILE_ATTRIBUTE_READONLY.0) == 0 {
            return Ok(());
        }
        let wide = wide_path(path);
        // Safety: wide is NUL terminated and outlives the call.
        unsafe {
            SetFileAttributesW(
                PCWSTR(wide.as_ptr()),
                FILE_FLAGS_AND_ATTRIBUTES(attributes & !FILE_ATTRIBUTE_READONLY.0),
            )
        }
        .map_err(|e| SecurityError::io("clear read-only attribute", path, win_io(&e)))
    }
}

struct HandleGuard(HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        // Safety: the guard owns a valid handle from CreateFileW or
        // OpenProcessToken.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

struct LocalGuard(HLOCAL);

impl Drop for LocalGuard {
    fn drop(&mut self) {
        // Safety: the pointer came from a Win32 API that allocates with
        // LocalAlloc.
        unsafe {
            let _ = LocalFree(Some(self.0));
        }
    }
}

/// A SID converted from its string form, owned by LocalAlloc.
struct LocalSid(PSID);

impl LocalSid {
    fn from_sid(path: &Path, sid: &Sid) -> Result<Self, SecurityError> {
        let wide: Vec<u16> = sid.as_str().encode_utf16().chain(Some(0)).collect();
        let mut psid = PSID::default();
        // Safety: wide is NUL terminated; psid receives a LocalAlloc block.
        unsafe { ConvertStringSidToSidW(PCWSTR(wide.as_ptr()), &mut psid) }.map_err(|_| {
            SecurityError::InvalidState(format!(
                "cannot convert SID {} for {}",
                sid,
                path.display()
            ))
        })?;
        Ok(Self(psid))
    }

    fn as_psid(&self) -> PSID {
        self.0
    }
}

impl Drop for LocalSid {
    fn drop(&mut self) {
        // Safety: ConvertStringSidToSidW allocates with LocalAlloc.
        unsafe {
            let _ = LocalFree(Some(HLOCAL(self.0 .0)));
        }
    }
}

fn wide_path(path: &Path) -> Vec<u16> {
    path.as_os_str().encode_wide().chain(Some(0)).collect()
}

fn win_io(error: &windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(error.code().0 & 0xFFFF)
}

fn os_error(path: &Path, action: &'static str, code: u32) -> SecurityError {
    if code == ERROR_FILE_NOT_FOUND.0 || code == ERROR_PATH_NOT_FOUND.0 {
        SecurityError::NotFound { path: path.into() }
    } else if code == ERROR_ACCESS_DENIED.0 {
        SecurityError::AccessDenied {
            path: path.into(),
            detail: action.to_owned(),
        }
    } else {
        SecurityError::io(action, path, io::Error::from_raw_os_error(code as i32))
    }
}

fn open_object(path: &Path, access: u32) -> Result<HandleGuard, SecurityError> {
    let wide = wide_path(path);
    // Safety: wide is NUL terminated and outlives the call.
    let handle = unsafe {
        CreateFileW(
            PCWSTR(wide.as_ptr()),
            access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            None,
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS,
            None,
        )
    }
    .map_err(|e| {
        let code = e.code().0 as u32 & 0xFFFF;
        os_error(path, "open object", code)
    })?;
    Ok(HandleGuard(handle))
}

fn attributes_of(path: &Path) -> Result<u32, SecurityError> {
    let wide = wide_path(path);
    // Safety: wide is NUL terminated and outlives the call.
    let attributes = unsafe { GetFileAttributesW(PCWSTR(wide.as_ptr())) };
    if attributes == INVALID_FILE_ATTRIBUTES {
        // Safety: immediately after the failing call on this thread.
        let code = unsafe { GetLastError() }.0;
        return Err(os_error(path, "query attributes", code));
    }
    Ok(attributes)
}

fn sid_from_ptr(path: &Path, psid: PSID) -> Result<Sid, SecurityError> {
    if psid.0.is_null() {
        return Err(SecurityError::InvalidState(format!(
            "descriptor for {} carries a null SID",
            path.display()
        )));
    }
    let mut buffer = PWSTR::null();
    // Safety: psid points into the descriptor block returned by
    // GetSecurityInfo, which is still alive here.
    unsafe { ConvertSidToStringSidW(psid, &mut buffer) }.map_err(|_| {
        SecurityError::InvalidState(format!("invalid SID on {}", path.display()))
    })?;
    let _guard = LocalGuard(HLOCAL(buffer.0.cast::<c_void>()));
    // Safety: ConvertSidToStringSidW produced a NUL terminated string.
    let text = unsafe { guard_pwstr_to_string(buffer) };
    Sid::parse(&text)
}

// Safety: `buffer` must point at a valid NUL terminated UTF-16 string.
unsafe fn guard_pwstr_to_string(buffer: PWSTR) -> String {
    unsafe { buffer.to_string().unwrap_or_default() }
}

fn descriptor_protected(
    path: &Path,
    sd: PSECURITY_DESCRIPTOR,
) -> Result<bool, SecurityError> {
    let mut control = SECURITY_DESCRIPTOR_CONTROL::default();
    let mut revision = 0u32;
    // Safety: sd is the valid descriptor returned by GetSecurityInfo.
    unsafe { GetSecurityDescriptorControl(sd, &mut control, &mut revision) }
        .map_err(|e| SecurityError::io("query descriptor control", path, win_io(&e)))?;
    Ok((control & SE_DACL_PROTECTED) == SE_DACL_PROTECTED)
}

/// Walks a raw DACL into the crate's [`Acl`] value.
///
/// A null DACL grants everything to everyone; it hydrates as an empty
/// list, which the mapping engine reads as mode 0 with the system entry
/// missing — exactly the "out of sync" answer a caller should get. Entry
/// types other than simple allow/deny are reported, never dropped.
fn parse_dacl(path: &Path, dacl: *const ACL) -> Result<Acl, SecurityError> {
    let mut acl = Acl::new();
    if dacl.is_null() {
        return Ok(acl);
    }

    // Safety: dacl points into the live descriptor block.
    let count = unsafe { (*dacl).AceCount };

    for index in 0..count {
        let mut ace_ptr: *mut c_void = ptr::null_mut();
        // Safety: index is within AceCount of a valid ACL.
        unsafe { GetAce(dacl, u32::from(index), &mut ace_ptr) }
            .map_err(|e| SecurityError::io("read DACL entry", path, win_io(&e)))?;

        // Safety: every ACE begins with an ACE_HEADER.
        let header = unsafe { *ace_ptr.cast::<ACE_HEADER>() };
        let kind = match header.AceType {
            ACCESS_ALLOWED_ACE_TYPE => AceKind::Allow,
            ACCESS_DENIED_ACE_TYPE => AceKind::Deny,
            other => {
                tracing::warn!(
                    path = %path.display(),
                    ace_type = other,
                    "unsupported access control entry"
                );
                return Err(SecurityError::UnsupportedEntry { ace_type: other });
            }
        };

        // Safety: allow and deny ACEs share the ACCESS_ALLOWED_ACE layout;
        // SidStart is the first DWORD of the inline SID.
        let (mask, sid) = unsafe {
            let ace = ace_ptr.cast::<ACCESS_ALLOWED_ACE>();
            let sid_ptr = PSID(ptr::addr_of!((*ace).SidStart).cast_mut().cast::<c_void>());
            ((*ace).Mask, sid_from_ptr(path, sid_ptr)?)
        };

        acl.push(Ace::new(
            sid,
            mask,
            AceFlags::from_raw(u32::from(header.AceFlags)),
            kind,
        ));
    }

    Ok(acl)
}

/// Serializes an [`Acl`] into a raw self-relative ACL buffer.
fn build_dacl(path: &Path, acl: &Acl) -> Result<Vec<u8>, SecurityError> {
    let mut buffer = vec![0u8; ACL_BUFFER_LEN];
    let raw = buffer.as_mut_ptr().cast::<ACL>();

    // Safety: the buffer is large enough for the header and zeroed.
    unsafe { InitializeAcl(raw, ACL_BUFFER_LEN as u32, ACL_REVISION) }
        .map_err(|e| SecurityError::io("initialize DACL", path, win_io(&e)))?;

    for ace in acl {
        let sid = LocalSid::from_sid(path, &ace.sid)?;
        let flags = ACE_FLAGS(ace.flags.as_raw());
        // Safety: raw points at the initialized ACL inside buffer and the
        // SID is valid for the duration of the call.
        let added = unsafe {
            match ace.kind {
                AceKind::Allow => {
                    AddAccessAllowedAceEx(raw, ACL_REVISION, flags, ace.mask, sid.as_psid())
                }
                AceKind::Deny => {
                    AddAccessDeniedAceEx(raw, ACL_REVISION, flags, ace.mask, sid.as_psid())
                }
            }
        };
        added.map_err(|e| SecurityError::io("append DACL entry", path, win_io(&e)))?;
    }

    Ok(buffer)
}
