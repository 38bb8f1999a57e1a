// Unit tests for id generation
// Covers base36 encoding, the timestamp token shape and sequential determinism

use crate::id::{IdSource, IdStrategy, Role, SequentialIds, TimestampIds, endpoint_identity, to_base36};

use std::collections::HashSet;

#[test]
fn given_known_values_when_to_base36_then_matches_javascript_encoding() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(35), "z");
    assert_eq!(to_base36(36), "10");
    assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
}

/// **VALUE**: Verifies timestamp ids have the `<base36 ms>-<6 chars>` shape.
///
/// **WHY THIS MATTERS**: Peers speaking the older dialect generate ids of this
/// shape. Keeping ours the same keeps logs comparable across both sides.
///
/// **BUG THIS CATCHES**: Would catch a missing zero-pad on the random suffix or
/// non-base36 characters sneaking in.
#[test]
fn given_timestamp_ids_when_generated_then_have_time_and_random_parts() {
    let ids = TimestampIds;

    let id = ids.next_id();
    let (time, random) = id.split_once('-').expect("id should contain '-'");

    assert!(!time.is_empty());
    assert_eq!(random.len(), 6, "Random suffix should be 6 chars: {id}");
    assert!(
        id.chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_lowercase()),
        "Should be base36: {id}"
    );
}

#[test]
fn given_timestamp_ids_when_many_generated_then_practically_unique() {
    let ids = TimestampIds;

    let generated: HashSet<String> = (0..1_000).map(|_| ids.next_id()).collect();

    assert_eq!(generated.len(), 1_000);
}

#[test]
fn given_sequential_ids_when_generated_then_count_up_from_zero() {
    let ids = SequentialIds::new();

    let generated: Vec<String> = (0..3).map(|_| ids.next_id()).collect();

    assert_eq!(generated, vec!["0", "1", "2"]);
}

#[test]
fn given_prefixed_sequential_ids_when_generated_then_prefix_applied() {
    let ids = SequentialIds::with_prefix("call-");

    assert_eq!(ids.next_id(), "call-0");
    assert_eq!(ids.next_id(), "call-1");
}

#[test]
fn given_role_when_endpoint_identity_then_prefixed_by_role() {
    let ids = SequentialIds::new();

    assert_eq!(endpoint_identity(Role::Server, &ids), "server-0");
    assert_eq!(endpoint_identity(Role::Client, &ids), "client-1");
}

#[test]
fn given_sequential_strategy_when_built_then_source_is_deterministic() {
    let source = IdStrategy::Sequential.build();

    assert_eq!(source.next_id(), "0");
    assert_eq!(source.next_id(), "1");
}
