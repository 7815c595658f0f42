#![warn(missing_docs)]
//! # geo-snap-app binary
//!
//! Headless demo entry point: runs one scripted capture session against the
//! synthetic platform services and prints the resulting gallery snapshot.

use std::sync::Arc;

use geo_snap_app::{AppError, SessionHarness, app_version, capture_enabled_from_env};
use geo_snap_camera::{CaptureOutcome, ScriptedCameraBackend};
use geo_snap_core::{Coordinates, ImageData};
use geo_snap_location::SyntheticLocationProvider;
use geo_snap_permissions::{
    Permission, PermissionDecision, PermissionStatus, ScriptedPermissions,
};

fn main() {
    env_logger::init();

    println!("geo-snap-app {}", app_version());
    println!(
        "capture_enabled={} (GEO_SNAP_CAPTURE_ENABLED)",
        capture_enabled_from_env()
    );

    if let Err(error) = run_demo_session() {
        eprintln!("demo session failed: {error}");
        std::process::exit(1);
    }
}

/// Scripted session: the user grants permissions at the first prompt, takes two
/// photos (one fix delivered, one unavailable), then backs out of a third.
fn run_demo_session() -> Result<(), AppError> {
    let camera = Arc::new(ScriptedCameraBackend::new(vec![
        CaptureOutcome::Captured(demo_photo(1)?),
        CaptureOutcome::Captured(demo_photo(2)?),
        CaptureOutcome::Cancelled,
    ]));
    let provider = Arc::new(SyntheticLocationProvider::new().with_update_fixes(vec![
        Some(Coordinates::new(37.0, -122.0)),
        None,
    ]));
    let permissions = Arc::new(ScriptedPermissions::denied());

    let mut harness = SessionHarness::new(camera, provider, permissions).with_prompt_answers(vec![
        PermissionDecision {
            permission: Permission::Camera,
            status: PermissionStatus::Granted,
        },
        PermissionDecision {
            permission: Permission::FineLocation,
            status: PermissionStatus::Granted,
        },
    ]);

    harness.start_session();
    for _ in 0..3 {
        harness.request_capture()?;
    }
    let tagged = harness.pump_location_updates()?;
    println!("location deliveries applied: {tagged}");

    let status = harness.status();
    println!(
        "screen={} records={} pending_resolutions={}",
        status.screen, status.records, status.pending_resolutions
    );

    let snapshot = harness.gallery();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(rendered) => println!("{rendered}"),
        Err(error) => eprintln!("gallery snapshot could not be rendered: {error}"),
    }

    Ok(())
}

fn demo_photo(value: u8) -> Result<ImageData, AppError> {
    let image = ImageData::new(2, 2, vec![value; 16])?;
    Ok(image)
}
