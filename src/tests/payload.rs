use reactive_graph::owner::provide_context;

use super::set_reactive_owner;
use crate::payload::ServerPayload;
use crate::props::PropMap;

#[test]
fn take_consumes_an_entry_exactly_once() {
    let payload = ServerPayload::new();
    payload.insert("Article", PropMap::from_iter([("title", "hello")]));

    assert_eq!(
        payload.take("Article"),
        Some(PropMap::from_iter([("title", "hello")])),
    );
    assert_eq!(payload.take("Article"), None);
    assert!(payload.is_empty());
}

#[test]
fn get_leaves_the_entry_in_place() {
    let payload = ServerPayload::new();
    payload.insert("Article", PropMap::from_iter([("title", "hello")]));

    assert!(payload.get("Article").is_some());
    assert!(payload.get("Article").is_some());
    assert!(!payload.is_empty());
}

#[test]
fn json_round_trip_preserves_entry_order() -> anyhow::Result<()> {
    let payload = ServerPayload::new();
    payload.insert("Header", PropMap::from_iter([("user", "carl")]));
    payload.insert("Article", PropMap::from_iter([("title", "hello")]));
    payload.insert("Footer", PropMap::new());

    let restored = ServerPayload::from_json(&payload.to_json()?)?;

    assert_eq!(restored.take("Header"), payload.take("Header"));
    assert_eq!(restored.take("Article"), payload.take("Article"));
    assert_eq!(restored.take("Footer"), Some(PropMap::new()));
    Ok(())
}

#[test]
fn handle_reaches_a_provided_payload() {
    let _owner = set_reactive_owner();
    let payload = ServerPayload::new();
    payload.insert("Article", PropMap::from_iter([("title", "hello")]));
    provide_context(payload);

    let handle = ServerPayload::handle();
    assert!(handle.get("Article").is_some());
    assert!(handle.take("Article").is_some());
    assert!(handle.take("Article").is_none());
}

#[test]
fn handle_without_context_misses_quietly() {
    let handle = ServerPayload::handle();
    assert!(handle.get("Article").is_none());
    assert!(handle.take("Article").is_none());
}
