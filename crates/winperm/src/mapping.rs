//! crates/winperm/src/mapping.rs
//!
//! The mode/security-descriptor translation engine.
//!
//! Windows walks an ordered list of allow/deny entries until a match is
//! found; POSIX picks exactly one of three classes. The two models are not
//! isomorphic, so this module computes a consistent, deterministic
//! approximation in both directions:
//!
//! - [`mode_of`] folds an arbitrary DACL — including one this engine did
//!   not build — into POSIX bits, tagging whatever cannot be represented
//!   with the diagnostic bits in [`crate::mode`].
//! - [`descriptor_for`] synthesizes a DACL from POSIX bits such that
//!   reading it back yields the same bits.
//!
//! Only "typical" permission shapes are supported, where group rights are
//! a subset of owner rights. Atypical lists degrade to diagnostic flags
//! rather than errors; the engine is total over any input DACL.

use crate::ace::AceFlags;
use crate::acl::Acl;
use crate::descriptor::SecurityDescriptor;
use crate::mode::{
    Mode, S_IRWXG, S_IRWXU, S_ISVTX, S_ISYSTEM_MISSING, S_IWGRP, S_IWOTH, S_IWUSR, S_IXGRP,
    S_IXOTH, S_IXUSR, S_IEXTRA, S_IROTH,
};
use crate::rights;
use crate::sid::{self, Sid};

/// The fixed mapping between composite file rights and POSIX bits, in
/// other-class positions. Execute deliberately excludes the
/// read-attributes right: almost every entry carries read-attributes, and
/// treating it as execute would report `x` on nearly everything.
const MASK_TO_MODE: [(u32, u32); 3] = [
    (rights::FILE_GENERIC_READ, S_IROTH),
    (rights::FILE_GENERIC_WRITE, S_IWOTH),
    (
        rights::FILE_GENERIC_EXECUTE & !rights::FILE_READ_ATTRIBUTES,
        S_IXOTH,
    ),
];

/// Baseline rights granted to the owner class regardless of mode bits.
const OWNER_BASELINE: u32 =
    rights::STANDARD_RIGHTS_ALL | rights::FILE_READ_ATTRIBUTES | rights::FILE_WRITE_ATTRIBUTES;

/// Baseline rights granted to the group and other classes regardless of
/// mode bits.
const GROUP_OTHER_BASELINE: u32 =
    rights::STANDARD_RIGHTS_READ | rights::FILE_READ_ATTRIBUTES | rights::SYNCHRONIZE;

/// Folds a descriptor's DACL into POSIX mode bits.
///
/// Entries are attributed to the owner, group, other (Everyone), sticky
/// marker (Nobody), or system class in that order; anything else sets
/// [`S_IEXTRA`]. A missing LocalSystem entry leaves [`S_ISYSTEM_MISSING`]
/// set. Inherit-only entries govern descendants, not the object, and are
/// skipped.
///
/// When the owner and group are the same principal, Windows grants access
/// on either entry, so owner and group bits are folded into each other
/// after every examined entry.
#[must_use]
pub fn mode_of(sd: &SecurityDescriptor, is_directory: bool) -> Mode {
    let owner_is_group = sd.owner() == sd.group();
    let mut mode = S_ISYSTEM_MISSING;

    for ace in sd.dacl() {
        if ace.inherit_only() {
            continue;
        }

        if ace.sid == *sd.owner() {
            for &(mask, bits) in &MASK_TO_MODE {
                if (ace.mask & mask) == mask {
                    mode |= bits << 6;
                }
            }
        } else if ace.sid == *sd.group() {
            for &(mask, bits) in &MASK_TO_MODE {
                if (ace.mask & mask) == mask {
                    mode |= bits << 3;
                }
            }
        } else if ace.sid.is(sid::EVERYONE) {
            for &(mask, bits) in &MASK_TO_MODE {
                if (ace.mask & mask) == mask {
                    mode |= bits;
                }
            }
            // write+create without delete-child on a directory is how the
            // sticky bit materializes for the world class
            let probe = rights::FILE_WRITE_DATA | rights::FILE_EXECUTE | rights::FILE_DELETE_CHILD;
            if is_directory
                && (ace.mask & probe) == (rights::FILE_WRITE_DATA | rights::FILE_EXECUTE)
            {
                mode |= S_ISVTX;
            }
        } else if ace.sid.is(sid::NOBODY) {
            if (ace.mask & rights::FILE_APPEND_DATA) != 0 {
                mode |= S_ISVTX;
            }
        } else if ace.sid.is(sid::LOCAL_SYSTEM) {
            // contributes no permission bits, only clears the anomaly flag
            mode &= !S_ISYSTEM_MISSING;
        } else {
            mode |= S_IEXTRA;
        }

        if owner_is_group {
            mode |= ((mode & S_IRWXG) << 3) | ((mode & S_IRWXU) >> 3);
        }
    }

    Mode::from_raw(mode)
}

/// Synthesizes a security descriptor realizing `mode` for the given owner
/// and group.
///
/// The DACL is built in canonical order — owner, group (when distinct),
/// Everyone, the Nobody sticky marker (always present, even with an empty
/// mask), LocalSystem, then the directory-only inherit-only templates for
/// CreatorOwner/CreatorGroup — so that writing the same mode twice
/// produces identical descriptors.
///
/// `existing_system_mask` carries the LocalSystem allow mask of the
/// previously read descriptor. It is consulted only when the owner or
/// group *is* LocalSystem: in every other case LocalSystem is granted full
/// control outright. The engine never invents a reduced system mask; with
/// no prior mask to preserve the system entry stays empty.
///
/// When the owner and group coincide, the group mask is merged into the
/// single owner entry and no group entry is emitted. A requested mode
/// whose owner and group bits differ is therefore widened; reading the
/// result back reports the widened mode. This matches the read-side
/// fold and is deliberate.
#[must_use]
pub fn descriptor_for(
    mode: Mode,
    owner: &Sid,
    group: &Sid,
    is_directory: bool,
    existing_system_mask: Option<u32>,
    protect: bool,
) -> SecurityDescriptor {
    let mode = mode.as_raw();

    let mut owner_allow = OWNER_BASELINE;
    let mut group_allow = GROUP_OTHER_BASELINE;
    let mut other_allow = GROUP_OTHER_BASELINE;
    let mut nobody_allow = 0;

    for &(mask, bits) in &MASK_TO_MODE {
        if ((mode >> 6) & bits) == bits {
            owner_allow |= mask;
        }
        if ((mode >> 3) & bits) == bits {
            group_allow |= mask;
        }
        if (mode & bits) == bits {
            other_allow |= mask;
        }
    }

    if (mode & S_ISVTX) != 0 {
        nobody_allow |= rights::FILE_APPEND_DATA;
    }

    let system_allow = if owner.is(sid::LOCAL_SYSTEM) || group.is(sid::LOCAL_SYSTEM) {
        existing_system_mask.unwrap_or(0)
    } else {
        rights::FULL_CONTROL
    };

    if is_directory {
        if (mode & (S_IWUSR | S_IXUSR)) == (S_IWUSR | S_IXUSR) {
            owner_allow |= rights::FILE_DELETE_CHILD;
        }
        // sticky reserves child deletion to the owner
        if (mode & (S_IWGRP | S_IXGRP)) == (S_IWGRP | S_IXGRP) && (mode & S_ISVTX) == 0 {
            group_allow |= rights::FILE_DELETE_CHILD;
        }
        if (mode & (S_IWOTH | S_IXOTH)) == (S_IWOTH | S_IXOTH) && (mode & S_ISVTX) == 0 {
            other_allow |= rights::FILE_DELETE_CHILD;
        }
    }

    let owner_is_group = owner == group;
    if owner_is_group {
        owner_allow |= group_allow;
    }

    let mut dacl = Acl::new();
    dacl.allow(owner.clone(), owner_allow);
    if !owner_is_group {
        dacl.allow(group.clone(), group_allow);
    }
    dacl.allow(sid::everyone(), other_allow);
    dacl.allow(sid::nobody(), nobody_allow);

    let system_flags = if is_directory {
        AceFlags::from_raw(AceFlags::CONTAINER_INHERIT | AceFlags::OBJECT_INHERIT)
    } else {
        AceFlags::default()
    };
    dacl.allow_with_flags(sid::local_system(), system_allow, system_flags);

    if is_directory {
        // inheritable templates so newly created children start out with
        // rights matching their creator's class
        let containers = AceFlags::from_raw(AceFlags::INHERIT_ONLY | AceFlags::CONTAINER_INHERIT);
        dacl.allow_with_flags(sid::creator_owner(), owner_allow, containers);
        dacl.allow_with_flags(sid::creator_group(), group_allow, containers);

        // children that are files keep the rights but never execute
        let objects = AceFlags::from_raw(AceFlags::INHERIT_ONLY | AceFlags::OBJECT_INHERIT);
        dacl.allow_with_flags(
            sid::creator_owner(),
            owner_allow & !rights::FILE_EXECUTE,
            objects,
        );
        dacl.allow_with_flags(
            sid::creator_group(),
            group_allow & !rights::FILE_EXECUTE,
            objects,
        );
    }

    SecurityDescriptor::new(owner.clone(), group.clone(), dacl, protect)
}

/// True when the owner, group, or Everyone class is granted the
/// write-data right.
///
/// Used to decide whether the read-only attribute must be cleared before
/// a synthesized descriptor is installed; a read-only attribute would make
/// the object appear non-writable regardless of the DACL. Only the three
/// class entries are consulted: the ever-present LocalSystem entry
/// carries full control on almost every descriptor and says nothing
/// about whether the requested mode needs the write bit.
#[must_use]
pub fn allows_write(sd: &SecurityDescriptor) -> bool {
    sd.dacl().iter().any(|ace| {
        ace.allows()
            && (ace.mask & rights::FILE_WRITE_DATA) != 0
            && (ace.sid == *sd.owner() || ace.sid == *sd.group() || ace.sid.is(sid::EVERYONE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ace::AceKind;

    fn owner() -> Sid {
        Sid::new("S-1-5-21-100-200-300-1001")
    }

    fn group() -> Sid {
        Sid::new("S-1-5-21-100-200-300-513")
    }

    fn stranger() -> Sid {
        Sid::new("S-1-5-21-900-900-900-9999")
    }

    fn roundtrip(mode: u32, owner_sid: &Sid, group_sid: &Sid, is_directory: bool) -> u32 {
        let sd = descriptor_for(
            Mode::from_raw(mode),
            owner_sid,
            group_sid,
            is_directory,
            None,
            true,
        );
        mode_of(&sd, is_directory).as_raw()
    }

    #[test]
    fn roundtrip_is_idempotent_for_distinct_owner_and_group() {
        for mode in [0o000, 0o400, 0o440, 0o444, 0o600, 0o640, 0o644, 0o700, 0o750, 0o755, 0o770, 0o777]
        {
            assert_eq!(roundtrip(mode, &owner(), &group(), false), mode, "{mode:o} file");
            assert_eq!(roundtrip(mode, &owner(), &group(), true), mode, "{mode:o} dir");
        }
    }

    #[test]
    fn roundtrip_is_idempotent_when_owner_is_group() {
        // owner==group is only well defined when both classes request the
        // same bits; contradictory modes are widened by design
        for mode in [0o000, 0o440, 0o550, 0o660, 0o770, 0o777] {
            assert_eq!(roundtrip(mode, &owner(), &owner(), false), mode, "{mode:o} file");
            assert_eq!(roundtrip(mode, &owner(), &owner(), true), mode, "{mode:o} dir");
        }
    }

    #[test]
    fn roundtrip_preserves_sticky_bit() {
        for mode in [0o1777, 0o1755, 0o1770] {
            assert_eq!(roundtrip(mode, &owner(), &group(), true), mode, "{mode:o}");
        }
        // sticky on a plain file travels via the Nobody marker
        assert_eq!(roundtrip(0o1644, &owner(), &group(), false), 0o1644);
    }

    #[test]
    fn contradictory_owner_group_mode_is_widened() {
        // owner==group cannot express 0750; both classes see the union
        assert_eq!(roundtrip(0o750, &owner(), &owner(), true), 0o770);
    }

    #[test]
    fn owner_group_coincidence_always_reports_equal_classes() {
        let mut dacl = Acl::new();
        dacl.allow(owner(), rights::FILE_GENERIC_READ | rights::FILE_GENERIC_WRITE);
        dacl.allow(sid::local_system(), rights::FULL_CONTROL);
        let sd = SecurityDescriptor::new(owner(), owner(), dacl, true);

        let mode = mode_of(&sd, false);
        let user = (mode.as_raw() & S_IRWXU) >> 6;
        let grp = (mode.as_raw() & S_IRWXG) >> 3;
        assert_eq!(user, grp);
        assert_eq!(user, 0o6);
    }

    #[test]
    fn unattributable_entry_sets_extra_flag() {
        for mode in [0o000, 0o644, 0o777] {
            let mut sd = descriptor_for(Mode::from_raw(mode), &owner(), &group(), false, None, true);
            assert!(!mode_of(&sd, false).has_extra_aces());

            let mut dacl = sd.dacl().clone();
            dacl.allow(stranger(), rights::FILE_GENERIC_READ);
            sd = SecurityDescriptor::new(sd.owner().clone(), sd.group().clone(), dacl, true);
            let read = mode_of(&sd, false);
            assert!(read.has_extra_aces());
            assert_eq!(read.permissions(), mode);
        }
    }

    #[test]
    fn missing_system_entry_is_flagged() {
        let mut dacl = Acl::new();
        dacl.allow(owner(), rights::FILE_GENERIC_READ);
        let sd = SecurityDescriptor::new(owner(), group(), dacl.clone(), true);
        assert!(mode_of(&sd, false).system_missing());

        dacl.allow(sid::local_system(), rights::FULL_CONTROL);
        let sd = SecurityDescriptor::new(owner(), group(), dacl, true);
        assert!(!mode_of(&sd, false).system_missing());
    }

    #[test]
    fn system_entry_contributes_no_permission_bits() {
        let mut dacl = Acl::new();
        dacl.allow(sid::local_system(), rights::FULL_CONTROL);
        let sd = SecurityDescriptor::new(owner(), group(), dacl, true);
        let mode = mode_of(&sd, false);
        assert_eq!(mode.permissions(), 0);
        assert!(!mode.system_missing());
        assert!(!mode.has_extra_aces());
    }

    #[test]
    fn inherit_only_entries_are_skipped_when_reading() {
        let mut dacl = Acl::new();
        dacl.allow_with_flags(
            owner(),
            rights::FULL_CONTROL,
            AceFlags::from_raw(AceFlags::INHERIT_ONLY | AceFlags::CONTAINER_INHERIT),
        );
        dacl.allow(sid::local_system(), rights::FULL_CONTROL);
        let sd = SecurityDescriptor::new(owner(), group(), dacl, true);
        assert_eq!(mode_of(&sd, true).permissions(), 0);
    }

    #[test]
    fn sticky_omits_delete_child_for_group_and_other() {
        let sticky = descriptor_for(Mode::from_raw(0o1777), &owner(), &group(), true, None, true);
        let masks: Vec<(String, u32)> = sticky
            .dacl()
            .iter()
            .map(|ace| (ace.sid.as_str().to_owned(), ace.mask))
            .collect();

        let owner_mask = masks[0].1;
        let group_mask = masks[1].1;
        let other_mask = masks[2].1;
        assert_ne!(owner_mask & rights::FILE_DELETE_CHILD, 0);
        assert_eq!(group_mask & rights::FILE_DELETE_CHILD, 0);
        assert_eq!(other_mask & rights::FILE_DELETE_CHILD, 0);

        let plain = descriptor_for(Mode::from_raw(0o777), &owner(), &group(), true, None, true);
        for ace in plain.dacl().iter().take(3) {
            assert_ne!(ace.mask & rights::FILE_DELETE_CHILD, 0, "{}", ace.sid);
        }
    }

    #[test]
    fn mode_0750_directory_builds_the_canonical_list() {
        let sd = descriptor_for(Mode::from_raw(0o750), &owner(), &group(), true, None, true);
        let aces: Vec<_> = sd.dacl().iter().cloned().collect();
        assert_eq!(aces.len(), 9);

        assert_eq!(aces[0].sid, owner());
        assert_eq!(
            aces[0].mask,
            OWNER_BASELINE
                | rights::FILE_GENERIC_READ
                | rights::FILE_GENERIC_WRITE
                | (rights::FILE_GENERIC_EXECUTE & !rights::FILE_READ_ATTRIBUTES)
                | rights::FILE_DELETE_CHILD
        );

        assert_eq!(aces[1].sid, group());
        assert_eq!(
            aces[1].mask,
            GROUP_OTHER_BASELINE
                | rights::FILE_GENERIC_READ
                | (rights::FILE_GENERIC_EXECUTE & !rights::FILE_READ_ATTRIBUTES)
        );

        assert_eq!(aces[2].sid, sid::everyone());
        assert_eq!(aces[2].mask, GROUP_OTHER_BASELINE);

        assert_eq!(aces[3].sid, sid::nobody());
        assert_eq!(aces[3].mask, 0);

        assert_eq!(aces[4].sid, sid::local_system());
        assert_eq!(aces[4].mask, rights::FULL_CONTROL);
        assert_eq!(
            aces[4].flags.as_raw(),
            AceFlags::CONTAINER_INHERIT | AceFlags::OBJECT_INHERIT
        );

        // four inherit-only creator templates, container pair first
        for ace in &aces[5..] {
            assert!(ace.inherit_only());
            assert_eq!(ace.kind, AceKind::Allow);
        }
        assert_eq!(aces[5].sid, sid::creator_owner());
        assert_eq!(aces[6].sid, sid::creator_group());
        assert_eq!(aces[7].sid, sid::creator_owner());
        assert_eq!(aces[7].mask & rights::FILE_EXECUTE, 0);
        assert_eq!(aces[8].sid, sid::creator_group());
        assert_eq!(aces[8].mask & rights::FILE_EXECUTE, 0);

        assert_eq!(mode_of(&sd, true).as_raw(), 0o750);
    }

    #[test]
    fn files_get_no_inheritable_entries() {
        let sd = descriptor_for(Mode::from_raw(0o644), &owner(), &group(), false, None, true);
        assert_eq!(sd.dacl().len(), 5);
        for ace in sd.dacl() {
            assert_eq!(ace.flags, AceFlags::default());
        }
    }

    #[test]
    fn system_owner_preserves_existing_mask() {
        let sd = descriptor_for(
            Mode::from_raw(0o700),
            &sid::local_system(),
            &group(),
            false,
            Some(0x1234),
            true,
        );
        let system_aces: Vec<_> = sd
            .dacl()
            .iter()
            .filter(|ace| ace.sid.is(sid::LOCAL_SYSTEM))
            .collect();
        // the owner entry plus the canonical system entry
        assert_eq!(system_aces.len(), 2);
        assert_eq!(system_aces[1].mask, 0x1234);

        // without a prior mask nothing is invented
        let sd = descriptor_for(
            Mode::from_raw(0o700),
            &sid::local_system(),
            &group(),
            false,
            None,
            true,
        );
        let last = sd
            .dacl()
            .iter()
            .filter(|ace| ace.sid.is(sid::LOCAL_SYSTEM))
            .next_back()
            .unwrap();
        assert_eq!(last.mask, 0);
    }

    #[test]
    fn protection_flag_is_passed_through() {
        let sd = descriptor_for(Mode::from_raw(0o644), &owner(), &group(), false, None, true);
        assert!(sd.protect());
        let sd = descriptor_for(Mode::from_raw(0o644), &owner(), &group(), false, None, false);
        assert!(!sd.protect());
    }

    #[test]
    fn allows_write_tracks_the_write_bit() {
        for (mode, expected) in [(0o444u32, false), (0o644, true), (0o020, true), (0o002, true)] {
            let sd = descriptor_for(Mode::from_raw(mode), &owner(), &group(), false, None, true);
            assert_eq!(allows_write(&sd), expected, "{mode:o}");
        }
    }

    #[test]
    fn write_grants_outside_the_three_classes_do_not_count() {
        // the canonical LocalSystem full-control entry is on nearly every
        // descriptor and must not force an attribute clear by itself
        let mut dacl = Acl::new();
        dacl.allow(sid::local_system(), rights::FULL_CONTROL);
        dacl.allow(stranger(), rights::FILE_GENERIC_WRITE);
        let sd = SecurityDescriptor::new(owner(), group(), dacl, true);
        assert!(!allows_write(&sd));
    }

    #[test]
    fn deny_entries_do_not_satisfy_allows_write() {
        let mut dacl = Acl::new();
        dacl.deny(owner(), rights::FILE_GENERIC_WRITE);
        let sd = SecurityDescriptor::new(owner(), group(), dacl, true);
        assert!(!allows_write(&sd));
    }
}
