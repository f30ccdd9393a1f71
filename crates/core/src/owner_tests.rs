use super::*;

#[test]
fn display_round_trips_string() {
    let owner = OwnerId::new("u1");
    assert_eq!(owner.to_string(), "u1");
    assert_eq!(owner, OwnerId::from("u1"));
}

#[test]
fn empty_owner_is_empty() {
    assert!(OwnerId::new("").is_empty());
    assert!(!OwnerId::new("u1").is_empty());
}

#[test]
fn distinct_owners_are_not_equal() {
    assert_ne!(OwnerId::new("u1"), OwnerId::new("u2"));
}
