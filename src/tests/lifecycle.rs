use crate::component::Lifecycle;
use crate::fetch::RouteParams;

fn params(id: &str) -> RouteParams {
    RouteParams::from_iter([("id", id)])
}

#[test]
fn param_change_invalidates_completed_fetch() {
    let mut lc = Lifecycle::new(params("1"));
    lc.missing_payload();
    lc.fetch_complete();
    assert!(lc.is_fetched());

    assert!(lc.sync_params(&params("2")));
    assert!(!lc.is_fetched());
}

#[test]
fn same_params_do_not_reset() {
    let mut lc = Lifecycle::new(params("1"));
    lc.fetch_complete();

    assert!(!lc.sync_params(&params("1")));
    assert!(lc.is_fetched());
}

#[test]
fn empty_initial_params_are_recorded_without_reset() {
    let mut lc = Lifecycle::new(RouteParams::new());
    lc.fetch_complete();

    // first non-empty params only establish the identity
    assert!(!lc.sync_params(&params("1")));
    assert!(lc.is_fetched());

    // a subsequent change does invalidate
    assert!(lc.sync_params(&params("2")));
    assert!(!lc.is_fetched());
}

#[test]
fn embedded_payload_never_requires_loader() {
    let mut lc = Lifecycle::new(params("1"));
    lc.embedded_payload();

    assert!(lc.is_fetched());
    assert!(!lc.must_recall());
    assert!(!lc.loading(false));
}

#[test]
fn missing_payload_requires_recall_and_loader() {
    let mut lc = Lifecycle::new(params("1"));
    lc.missing_payload();

    assert!(lc.must_recall());
    assert!(lc.loading(false));

    lc.fetch_complete();
    assert!(!lc.loading(false));
}

#[test]
fn loading_is_suppressed_while_disabled() {
    let mut lc = Lifecycle::new(params("1"));
    lc.missing_payload();

    assert!(lc.loading(false));
    assert!(!lc.loading(true));
}

#[test]
fn loader_defaults_off_for_the_server_pass() {
    // the server never marks the loader; a fresh instance must render
    // without one
    let lc = Lifecycle::new(params("1"));
    assert!(!lc.loading(false));
}
