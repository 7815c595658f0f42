//! Shared fixtures for app integration tests.

use std::sync::Arc;

use geo_snap_app::SessionHarness;
use geo_snap_camera::{CaptureOutcome, ScriptedCameraBackend};
use geo_snap_core::{Coordinates, ImageData};
use geo_snap_location::SyntheticLocationProvider;
use geo_snap_permissions::{PermissionStatus, ScriptedPermissions};

/// Creates a deterministic 2x2 photo payload.
#[allow(dead_code)]
pub fn fixture_image(value: u8) -> ImageData {
    ImageData::new(2, 2, vec![value; 16]).expect("image fixture should be valid")
}

/// Creates a camera replaying one successful capture per value.
#[allow(dead_code)]
pub fn camera_with_photos(values: &[u8]) -> Arc<ScriptedCameraBackend> {
    let outcomes = values
        .iter()
        .map(|value| CaptureOutcome::Captured(fixture_image(*value)))
        .collect();
    Arc::new(ScriptedCameraBackend::new(outcomes))
}

/// Creates a permission service with camera and location granted.
#[allow(dead_code)]
pub fn granted_permissions() -> Arc<ScriptedPermissions> {
    Arc::new(ScriptedPermissions::new(
        PermissionStatus::Granted,
        PermissionStatus::Granted,
    ))
}

/// Creates a permission service with camera granted and location denied.
#[allow(dead_code)]
pub fn location_denied_permissions() -> Arc<ScriptedPermissions> {
    Arc::new(ScriptedPermissions::new(
        PermissionStatus::Granted,
        PermissionStatus::Denied,
    ))
}

/// Creates a provider with one cached fix and no scripted deliveries.
#[allow(dead_code)]
pub fn provider_with_cached_fix(latitude: f64, longitude: f64) -> Arc<SyntheticLocationProvider> {
    Arc::new(SyntheticLocationProvider::new().with_cached(Coordinates::new(latitude, longitude)))
}

/// Builds a started harness over the given services.
#[allow(dead_code)]
pub fn started_harness(
    camera: Arc<ScriptedCameraBackend>,
    provider: Arc<SyntheticLocationProvider>,
    permissions: Arc<ScriptedPermissions>,
) -> SessionHarness {
    let mut harness = SessionHarness::new(camera, provider, permissions);
    harness.start_session();
    harness
}
