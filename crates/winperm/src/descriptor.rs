//! crates/winperm/src/descriptor.rs
//!
//! The security descriptor: owner, group, DACL, and the inheritance
//! protection flag for one securable object.

use crate::acl::Acl;
use crate::sid::Sid;

/// Owner, group, DACL, and protection flag for one object.
///
/// Owner and group are part of the same consistency unit as the DACL:
/// entries name the principal they apply to, so changing the owner or
/// group first re-points the affected entries via
/// [`Acl::reassign`]. The setters below do exactly that; construction
/// stores the fields as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDescriptor {
    owner: Sid,
    group: Sid,
    dacl: Acl,
    protect: bool,
}

impl SecurityDescriptor {
    /// Creates a descriptor from its parts, with no reassignment.
    #[must_use]
    pub fn new(owner: Sid, group: Sid, dacl: Acl, protect: bool) -> Self {
        Self {
            owner,
            group,
            dacl,
            protect,
        }
    }

    /// The owning principal.
    #[must_use]
    pub fn owner(&self) -> &Sid {
        &self.owner
    }

    /// The group principal.
    #[must_use]
    pub fn group(&self) -> &Sid {
        &self.group
    }

    /// The discretionary access-control list.
    #[must_use]
    pub fn dacl(&self) -> &Acl {
        &self.dacl
    }

    /// True when the object blocks inheritance from its parent container.
    #[must_use]
    pub const fn protect(&self) -> bool {
        self.protect
    }

    /// Changes the owner, re-pointing DACL entries that referenced the old
    /// owner. No-op when `owner` equals the current owner.
    pub fn set_owner(&mut self, owner: Sid) {
        if self.owner != owner {
            self.dacl.reassign(&self.owner, &owner);
            self.owner = owner;
        }
    }

    /// Changes the group, re-pointing DACL entries that referenced the old
    /// group. No-op when `group` equals the current group.
    pub fn set_group(&mut self, group: Sid) {
        if self.group != group {
            self.dacl.reassign(&self.group, &group);
            self.group = group;
        }
    }
}
