#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(windows), deny(unsafe_code))]

//! Deterministic POSIX permission mapping for Windows security
//! descriptors.
//!
//! POSIX evaluates access by picking exactly one of three classes (owner,
//! group, other); Windows walks an ordered allow/deny list until a match
//! is found. The two models are not isomorphic, so a tool that wants to
//! ask "is this object already in the desired state?" needs a mapping
//! that is *consistent and deterministic* in both directions rather than
//! lossless. This crate provides that mapping:
//!
//! - [`mapping::mode_of`] folds a descriptor into POSIX bits, tagging
//!   anything unrepresentable with diagnostic bits instead of failing.
//! - [`mapping::descriptor_for`] synthesizes a DACL from POSIX bits that
//!   reads back to the same bits.
//! - [`acl::Acl::reassign`] re-points entries when an owner or group
//!   changes, including entries inherited from a parent container which
//!   cannot be edited in place.
//! - [`security::FileSecurity`] ties the pure engine to a
//!   [`store::SecurityStore`]; on Windows [`store_win`] provides the
//!   Win32-backed store, elevating backup/restore privileges around each
//!   descriptor operation via [`privilege::with_privilege`].
//!
//! Only "typical" modes are supported, where group rights are a subset of
//! owner rights; atypical lists are flagged, not reconstructed. The
//! system access-control list (auditing) is deliberately untouched.

pub mod ace;
pub mod acl;
pub mod descriptor;
pub mod error;
pub mod mapping;
pub mod mode;
pub mod privilege;
pub mod rights;
pub mod security;
pub mod sid;
pub mod store;
#[cfg(windows)]
pub mod store_win;

pub use ace::{Ace, AceFlags, AceKind};
pub use acl::Acl;
pub use descriptor::SecurityDescriptor;
pub use error::SecurityError;
pub use mapping::{allows_write, descriptor_for, mode_of};
pub use mode::Mode;
pub use security::{FileSecurity, SecurityInfo};
pub use sid::Sid;
pub use store::{NameResolver, SecurityStore};
