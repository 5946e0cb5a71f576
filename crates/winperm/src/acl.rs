//! crates/winperm/src/acl.rs
//!
//! The discretionary access-control list: an ordered sequence of allow and
//! deny entries. Order is significant twice over — the OS evaluates entries
//! first-match-wins, and [`Acl::reassign`] inserts synthesized entries at
//! fixed positions so repeated writes of the same mode stay idempotent.

use crate::ace::{Ace, AceFlags, AceKind};
use crate::rights;
use crate::sid::{self, Sid};

/// An ordered list of access-control entries.
///
/// Duplicate or contradictory entries are permitted, mirroring the OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    aces: Vec<Ace>,
}

impl Acl {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { aces: Vec::new() }
    }

    /// Appends an allow entry with no inheritance flags.
    pub fn allow(&mut self, sid: Sid, mask: u32) {
        self.allow_with_flags(sid, mask, AceFlags::default());
    }

    /// Appends an allow entry carrying explicit inheritance flags.
    pub fn allow_with_flags(&mut self, sid: Sid, mask: u32, flags: AceFlags) {
        self.aces.push(Ace::new(sid, mask, flags, AceKind::Allow));
    }

    /// Appends a deny entry with no inheritance flags.
    pub fn deny(&mut self, sid: Sid, mask: u32) {
        self.deny_with_flags(sid, mask, AceFlags::default());
    }

    /// Appends a deny entry carrying explicit inheritance flags.
    pub fn deny_with_flags(&mut self, sid: Sid, mask: u32, flags: AceFlags) {
        self.aces.push(Ace::new(sid, mask, flags, AceKind::Deny));
    }

    /// Appends an already-constructed entry, preserving its kind and flags.
    pub fn push(&mut self, ace: Ace) {
        self.aces.push(ace);
    }

    /// Iterates entries in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Ace> {
        self.aces.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aces.len()
    }

    /// True when the list carries no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aces.is_empty()
    }

    /// Returns the entries that apply to `sid`, in order.
    pub fn aces_for<'a>(&'a self, sid: &'a Sid) -> impl Iterator<Item = &'a Ace> {
        self.aces.iter().filter(move |ace| ace.sid == *sid)
    }

    /// ORs together the allow masks held by `sid`, or `None` when the
    /// principal holds no allow entry. Used to carry an existing
    /// caller-managed mask forward when a DACL is rebuilt.
    #[must_use]
    pub fn mask_for(&self, sid: &Sid) -> Option<u32> {
        let mut mask = None;
        for ace in self.aces_for(sid).filter(|ace| ace.allows()) {
            mask = Some(mask.unwrap_or(0) | ace.mask);
        }
        mask
    }

    /// Re-points every entry for `old` at `new`, in place.
    ///
    /// Non-inherited matches simply have their principal rewritten.
    /// Inherited matches belong to the parent's policy and cannot be edited
    /// here: the original entry is left untouched and a synthesized entry
    /// for `new` — same mask and kind, flags reduced to the inheritance
    /// subset — is inserted ahead of the list, preserving the matches'
    /// relative order.
    ///
    /// Retargeting LocalSystem itself must not silently revoke the system
    /// account's access, so in that case a fresh full-control allow entry
    /// for LocalSystem is prepended in front of everything else.
    pub fn reassign(&mut self, old: &Sid, new: &Sid) {
        let mut synthesized: Vec<Ace> = Vec::new();
        let mut restore_system = false;

        for ace in &mut self.aces {
            if ace.sid != *old {
                continue;
            }

            if ace.inherited() {
                synthesized.push(Ace::new(
                    new.clone(),
                    ace.mask,
                    ace.flags.masked(AceFlags::INHERITANCE_MASK),
                    ace.kind,
                ));
            } else {
                ace.sid = new.clone();
            }

            if old.is(sid::LOCAL_SYSTEM) {
                restore_system = true;
            }
        }

        if restore_system {
            synthesized.insert(
                0,
                Ace::new(
                    sid::local_system(),
                    rights::STANDARD_RIGHTS_ALL | rights::SPECIFIC_RIGHTS_ALL,
                    AceFlags::default(),
                    AceKind::Allow,
                ),
            );
        }

        self.aces.splice(0..0, synthesized);
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a Ace;
    type IntoIter = std::slice::Iter<'a, Ace>;

    fn into_iter(self) -> Self::IntoIter {
        self.aces.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: u32) -> Sid {
        Sid::new(format!("S-1-5-21-1-2-3-{n}"))
    }

    #[test]
    fn builders_append_in_order() {
        let mut acl = Acl::new();
        acl.allow(user(1), rights::FILE_GENERIC_READ);
        acl.deny(user(2), rights::FILE_GENERIC_WRITE);
        acl.allow(user(1), rights::FILE_GENERIC_READ); // duplicates allowed

        let kinds: Vec<_> = acl.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AceKind::Allow, AceKind::Deny, AceKind::Allow]);
        assert_eq!(acl.len(), 3);
    }

    #[test]
    fn aces_for_filters_by_principal() {
        let mut acl = Acl::new();
        acl.allow(user(1), 0x1);
        acl.allow(user(2), 0x2);
        acl.deny(user(1), 0x4);

        let masks: Vec<_> = acl.aces_for(&user(1)).map(|a| a.mask).collect();
        assert_eq!(masks, vec![0x1, 0x4]);
    }

    #[test]
    fn mask_for_ors_allow_entries_only() {
        let mut acl = Acl::new();
        acl.allow(user(1), 0x1);
        acl.allow(user(1), 0x8);
        acl.deny(user(1), 0x4);
        assert_eq!(acl.mask_for(&user(1)), Some(0x9));
        assert_eq!(acl.mask_for(&user(9)), None);
    }

    #[test]
    fn reassign_edits_plain_entries_in_place() {
        let mut acl = Acl::new();
        acl.allow(user(1), 0x1F);
        acl.allow(user(2), 0x2F);

        acl.reassign(&user(1), &user(3));

        assert_eq!(acl.len(), 2);
        assert_eq!(acl.iter().next().unwrap().sid, user(3));
        assert_eq!(acl.iter().next().unwrap().mask, 0x1F);
    }

    #[test]
    fn reassign_keeps_inherited_entries_and_synthesizes_retargets() {
        let mut acl = Acl::new();
        acl.allow_with_flags(
            user(1),
            0x1F,
            AceFlags::from_raw(AceFlags::INHERITED | AceFlags::CONTAINER_INHERIT),
        );

        acl.reassign(&user(1), &user(2));

        let aces: Vec<_> = acl.iter().cloned().collect();
        assert_eq!(aces.len(), 2);

        assert_eq!(aces[0].sid, user(2));
        assert_eq!(aces[0].mask, 0x1F);
        assert_eq!(aces[0].flags.as_raw(), AceFlags::CONTAINER_INHERIT);
        assert_eq!(aces[0].kind, AceKind::Allow);

        // the parent's entry survives untouched
        assert_eq!(aces[1].sid, user(1));
        assert_eq!(
            aces[1].flags.as_raw(),
            AceFlags::INHERITED | AceFlags::CONTAINER_INHERIT
        );
    }

    #[test]
    fn reassign_strips_non_inheritance_flags_from_retargets() {
        let mut acl = Acl::new();
        acl.deny_with_flags(
            user(1),
            0x4,
            AceFlags::from_raw(
                AceFlags::INHERITED
                    | AceFlags::OBJECT_INHERIT
                    | AceFlags::INHERIT_ONLY
                    | AceFlags::NO_PROPAGATE_INHERIT,
            ),
        );

        acl.reassign(&user(1), &user(2));

        let first = acl.iter().next().unwrap();
        assert_eq!(first.kind, AceKind::Deny);
        assert_eq!(
            first.flags.as_raw(),
            AceFlags::OBJECT_INHERIT | AceFlags::INHERIT_ONLY
        );
    }

    #[test]
    fn reassign_away_from_system_restores_full_control() {
        let mut acl = Acl::new();
        acl.allow(sid::local_system(), rights::FULL_CONTROL);

        acl.reassign(&sid::local_system(), &user(1));

        let aces: Vec<_> = acl.iter().cloned().collect();
        assert_eq!(aces.len(), 2);
        assert_eq!(aces[0].sid, sid::local_system());
        assert_eq!(
            aces[0].mask,
            rights::STANDARD_RIGHTS_ALL | rights::SPECIFIC_RIGHTS_ALL
        );
        assert_eq!(aces[0].kind, AceKind::Allow);
        assert_eq!(aces[1].sid, user(1));
        assert_eq!(aces[1].mask, rights::FULL_CONTROL);
    }

    #[test]
    fn reassign_away_from_system_prepends_before_synthesized_entries() {
        let mut acl = Acl::new();
        acl.allow_with_flags(
            sid::local_system(),
            0x1F,
            AceFlags::from_raw(AceFlags::INHERITED | AceFlags::OBJECT_INHERIT),
        );

        acl.reassign(&sid::local_system(), &user(1));

        let aces: Vec<_> = acl.iter().cloned().collect();
        assert_eq!(aces.len(), 3);
        assert_eq!(aces[0].sid, sid::local_system());
        assert_eq!(aces[0].mask, rights::FULL_CONTROL);
        assert_eq!(aces[1].sid, user(1));
        assert_eq!(aces[1].flags.as_raw(), AceFlags::OBJECT_INHERIT);
        assert!(aces[2].inherited());
    }

    #[test]
    fn reassign_without_matches_is_a_no_op() {
        let mut acl = Acl::new();
        acl.allow(user(1), 0x1);
        let before = acl.clone();

        acl.reassign(&user(8), &user(9));
        assert_eq!(acl, before);
    }
}
