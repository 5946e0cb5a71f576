//! crates/winperm/src/ace.rs
//!
//! Access-control entries: one allow or deny rule binding a principal to
//! an access mask. Entries are plain values; an [`Ace`] is created by the
//! [`Acl`](crate::acl::Acl) builders and owned exclusively by its list.

use crate::sid::Sid;

/// Whether an entry grants or revokes its access mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AceKind {
    /// Access allowed.
    Allow,
    /// Access denied.
    Deny,
}

/// Inheritance-related entry flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AceFlags(u32);

impl AceFlags {
    /// Entry is inherited by non-container children.
    pub const OBJECT_INHERIT: u32 = 0x01;
    /// Entry is inherited by container children.
    pub const CONTAINER_INHERIT: u32 = 0x02;
    /// Inheritance stops after one level of children.
    pub const NO_PROPAGATE_INHERIT: u32 = 0x04;
    /// Entry only seeds children; it does not govern the object itself.
    pub const INHERIT_ONLY: u32 = 0x08;
    /// Entry was inherited from the parent container.
    pub const INHERITED: u32 = 0x10;

    /// The subset of flags that survive retargeting an inherited entry.
    pub const INHERITANCE_MASK: u32 =
        Self::CONTAINER_INHERIT | Self::OBJECT_INHERIT | Self::INHERIT_ONLY;

    /// Creates flags from a raw bit value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw bit value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks whether all bits of `flag` are set.
    #[must_use]
    pub const fn contains(self, flag: u32) -> bool {
        (self.0 & flag) == flag
    }

    /// Returns the flags restricted to `mask`.
    #[must_use]
    pub const fn masked(self, mask: u32) -> Self {
        Self(self.0 & mask)
    }
}

/// One access-control entry.
///
/// Any mask/flag combination is accepted as constructed; whether it is
/// meaningful is the caller's concern, exactly as with the OS APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    /// Principal the entry applies to.
    pub sid: Sid,
    /// Access mask granted or revoked.
    pub mask: u32,
    /// Inheritance flags.
    pub flags: AceFlags,
    /// Allow or deny.
    pub kind: AceKind,
}

impl Ace {
    /// Creates a new entry.
    #[must_use]
    pub fn new(sid: Sid, mask: u32, flags: AceFlags, kind: AceKind) -> Self {
        Self {
            sid,
            mask,
            flags,
            kind,
        }
    }

    /// True when the entry came down from the parent container.
    #[must_use]
    pub const fn inherited(&self) -> bool {
        self.flags.contains(AceFlags::INHERITED)
    }

    /// True when the entry only seeds children and does not govern the
    /// object itself.
    #[must_use]
    pub const fn inherit_only(&self) -> bool {
        self.flags.contains(AceFlags::INHERIT_ONLY)
    }

    /// True for allow entries.
    #[must_use]
    pub const fn allows(&self) -> bool {
        matches!(self.kind, AceKind::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sid;

    #[test]
    fn equality_covers_all_fields() {
        let base = Ace::new(sid::everyone(), 0x1F, AceFlags::default(), AceKind::Allow);
        assert_eq!(base, base.clone());

        let mut other = base.clone();
        other.mask = 0x1E;
        assert_ne!(base, other);

        let mut other = base.clone();
        other.kind = AceKind::Deny;
        assert_ne!(base, other);

        let mut other = base.clone();
        other.flags = AceFlags::from_raw(AceFlags::INHERITED);
        assert_ne!(base, other);
    }

    #[test]
    fn flag_accessors() {
        let ace = Ace::new(
            sid::everyone(),
            0,
            AceFlags::from_raw(AceFlags::INHERITED | AceFlags::CONTAINER_INHERIT),
            AceKind::Allow,
        );
        assert!(ace.inherited());
        assert!(!ace.inherit_only());
        assert_eq!(
            ace.flags.masked(AceFlags::INHERITANCE_MASK).as_raw(),
            AceFlags::CONTAINER_INHERIT
        );
    }
}
