//! Integration tests for the update-subscription fallback path.

mod common;

use std::sync::Arc;

use geo_snap_core::Coordinates;
use geo_snap_location::SyntheticLocationProvider;

use common::{granted_permissions, started_harness};

#[test]
fn location_subscription_tests_first_delivery_resolves_and_unsubscribes() {
    let camera = common::camera_with_photos(&[1]);
    let provider = Arc::new(
        SyntheticLocationProvider::new()
            .with_update_fixes(vec![Some(Coordinates::new(48.5, 9.0))]),
    );
    let mut harness = started_harness(camera, Arc::clone(&provider), granted_permissions());

    harness.request_capture().expect("capture should run");
    assert_eq!(harness.gallery().entries[0].location_state, "pending");
    assert_eq!(provider.active_subscriptions(), 1);

    let tagged = harness.pump_location_updates().expect("pump should run");

    assert_eq!(tagged, 1);
    assert_eq!(provider.active_subscriptions(), 0);
    let gallery = harness.gallery();
    assert_eq!(gallery.entries[0].location_state, "resolved");
    assert_eq!(gallery.entries[0].caption, "Lat: 48.5, Lon: 9.0");
    assert_eq!(harness.coordinator().outstanding_resolutions(), 0);
}

#[test]
fn location_subscription_tests_null_delivery_is_terminal_unavailable() {
    let camera = common::camera_with_photos(&[2]);
    let provider = Arc::new(SyntheticLocationProvider::new().with_update_fixes(vec![None]));
    let mut harness = started_harness(camera, Arc::clone(&provider), granted_permissions());

    harness.request_capture().expect("capture should run");
    let tagged = harness.pump_location_updates().expect("pump should run");

    assert_eq!(tagged, 1);
    let gallery = harness.gallery();
    assert_eq!(gallery.entries[0].location_state, "unavailable");
    assert_eq!(gallery.entries[0].caption, "Location unavailable");
}

#[test]
fn location_subscription_tests_tag_transitions_at_most_once() {
    let camera = common::camera_with_photos(&[3]);
    let provider = Arc::new(
        SyntheticLocationProvider::new().with_update_fixes(vec![
            Some(Coordinates::new(1.0, 2.0)),
            Some(Coordinates::new(3.0, 4.0)),
        ]),
    );
    let mut harness = started_harness(camera, Arc::clone(&provider), granted_permissions());

    harness.request_capture().expect("capture should run");
    let first_pump = harness.pump_location_updates().expect("pump should run");
    let second_pump = harness.pump_location_updates().expect("pump should run");

    // The second scripted fix has no live subscription left to ride on.
    assert_eq!(first_pump, 1);
    assert_eq!(second_pump, 0);
    assert_eq!(harness.gallery().entries[0].caption, "Lat: 1.0, Lon: 2.0");
}
