//! Integration tests for the cached last-known location fast path.

mod common;

use common::{granted_permissions, provider_with_cached_fix, started_harness};

#[test]
fn location_cached_path_tests_cached_fix_resolves_without_subscribing() {
    let camera = common::camera_with_photos(&[1]);
    let provider = provider_with_cached_fix(37.0, -122.0);
    let mut harness = started_harness(camera, std::sync::Arc::clone(&provider), granted_permissions());

    harness.request_capture().expect("capture should run");

    let gallery = harness.gallery();
    assert_eq!(gallery.entries[0].location_state, "resolved");
    assert_eq!(gallery.entries[0].caption, "Lat: 37.0, Lon: -122.0");
    assert_eq!(harness.coordinator().outstanding_resolutions(), 0);

    // The update-subscription path is never taken when a cached fix exists.
    assert_eq!(provider.last_known_calls(), 1);
    assert_eq!(provider.subscribe_calls(), 0);
}
