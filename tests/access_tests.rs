//! The ownership-plus-grant rule, checked as plain truth tables.

use keepsake::access::{can_modify, can_read};

const OWNER: &str = "owner-id";
const OTHER: &str = "other-id";

#[test]
fn owners_always_read_their_own_records() {
    assert!(can_read(OWNER, OWNER, false));
    assert!(can_read(OWNER, OWNER, true));
}

#[test]
fn strangers_read_nothing_without_a_grant() {
    assert!(!can_read(OTHER, OWNER, false));
}

#[test]
fn a_grant_opens_read_access_and_its_absence_closes_it() {
    assert!(can_read(OTHER, OWNER, true));
    assert!(!can_read(OTHER, OWNER, false));
}

#[test]
fn write_access_is_owner_only_whatever_the_grant_says() {
    assert!(can_modify(OWNER, OWNER));
    assert!(!can_modify(OTHER, OWNER));
}
