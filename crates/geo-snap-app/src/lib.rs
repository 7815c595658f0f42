#![warn(missing_docs)]
//! # geo-snap-app
//!
//! ## Purpose
//! Orchestrates permissions, camera capture, location resolution, and UI state
//! for `geo-snap`.
//!
//! ## Responsibilities
//! - Run the permission -> capture -> locate workflow as an explicit state
//!   machine driven by host-loop events.
//! - Emit platform requests (permission prompts, capture launches) instead of
//!   calling platform services directly.
//! - Route asynchronous location deliveries onto the record that started them.
//! - Provide a deterministic session harness playing the host event loop for
//!   tests and the demo binary.
//!
//! ## Data flow
//! Capture request -> permission gate -> capture launch -> record append ->
//! location resolution -> terminal tag write -> gallery projection.
//!
//! ## Ownership and lifetimes
//! The coordinator owns the record store and resolver; platform services are
//! shared trait objects injected by the host.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. Workflow-level outcomes
//! (denied permissions, cancelled captures, missing fixes) are terminal record
//! states or absent records, never errors.
//!
//! ## Security and privacy notes
//! - Capture is blocked unless the camera permission gate passes.
//! - The `GEO_SNAP_CAPTURE_ENABLED` kill switch can stop new captures at
//!   runtime.
//! - Log lines carry record/subscription identities, never coordinates or
//!   pixel data.

use std::collections::VecDeque;
use std::sync::Arc;

use geo_snap_camera::{CameraBackend, CameraError, CaptureOutcome};
use geo_snap_core::{Coordinates, CoreError, LocationTag, RecordId, RecordStore, TagWrite};
use geo_snap_location::{
    LocationError, LocationProvider, LocationResolver, ResolveOutcome, SubscriptionId,
    SyntheticLocationProvider, UpdateConfig,
};
use geo_snap_permissions::{
    Permission, PermissionDecision, PermissionService, ScriptedPermissions, decision_for,
};
use geo_snap_ui::{GallerySnapshot, UiState, gallery_snapshot};
use log::{debug, info, warn};
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("GEO_SNAP_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Outward request the coordinator asks the host loop to fulfill.
///
/// The coordinator never calls the camera or prompt services directly; it
/// returns these values and the host feeds the completion events back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRequest {
    /// Show the system permission prompt for the listed permissions.
    PromptPermissions(Vec<Permission>),
    /// Launch the camera capture intent.
    LaunchCapture,
}

/// Orchestrates the capture-and-locate workflow.
///
/// All methods run on the host loop thread; suspension points are method
/// boundaries, and every asynchronous completion is routed by an explicit
/// identity (`RecordId`, `SubscriptionId`) captured when the work started.
pub struct CaptureCoordinator {
    store: RecordStore,
    resolver: LocationResolver,
    permissions: Arc<dyn PermissionService>,
    prompt_in_flight: bool,
}

impl CaptureCoordinator {
    /// Creates a coordinator over the injected platform services.
    pub fn new(
        permissions: Arc<dyn PermissionService>,
        provider: Arc<dyn LocationProvider>,
        config: UpdateConfig,
    ) -> Self {
        Self {
            store: RecordStore::new(),
            resolver: LocationResolver::new(provider, config),
            permissions,
            prompt_in_flight: false,
        }
    }

    /// Handles the user's capture request.
    ///
    /// # Returns
    /// `LaunchCapture` when the camera permission is already granted, or one
    /// combined camera+location prompt otherwise. While a prompt is
    /// outstanding, further requests are dropped.
    pub fn on_capture_requested(&mut self) -> Vec<PlatformRequest> {
        if self.prompt_in_flight {
            debug!("capture request dropped: permission prompt already outstanding");
            return Vec::new();
        }

        if self.permissions.status(Permission::Camera).is_granted() {
            return vec![PlatformRequest::LaunchCapture];
        }

        self.prompt_in_flight = true;
        vec![PlatformRequest::PromptPermissions(vec![
            Permission::Camera,
            Permission::FineLocation,
        ])]
    }

    /// Handles the outcome of a permission prompt.
    ///
    /// # Returns
    /// `LaunchCapture` when the parked capture request can proceed (camera
    /// granted). A declined camera permission ends the request with no record
    /// and no retry. Results without a parked request are ignored.
    pub fn on_permissions_result(
        &mut self,
        decisions: &[PermissionDecision],
    ) -> Vec<PlatformRequest> {
        if !self.prompt_in_flight {
            debug!("permission result without outstanding prompt ignored");
            return Vec::new();
        }
        self.prompt_in_flight = false;

        if decision_for(decisions, Permission::Camera).is_granted() {
            return vec![PlatformRequest::LaunchCapture];
        }

        info!("camera permission declined; capture request ends without a record");
        Vec::new()
    }

    /// Handles the camera intent result.
    ///
    /// # Semantics
    /// A cancelled capture appends nothing. A captured photo is appended with a
    /// `Pending` tag, then location resolution starts for exactly that record
    /// id. Resolution failures degrade to a terminal `Unavailable` tag.
    ///
    /// # Errors
    /// Returns [`AppError::Core`] only for store bookkeeping violations, which
    /// indicate a coordinator bug rather than a workflow outcome.
    pub fn on_capture_result(
        &mut self,
        outcome: CaptureOutcome,
        captured_at_ms: u64,
    ) -> Result<Option<RecordId>, AppError> {
        let image = match outcome {
            CaptureOutcome::Captured(image) => image,
            CaptureOutcome::Cancelled => {
                info!("capture cancelled; no record appended");
                return Ok(None);
            }
        };

        let id = self.store.append(image, captured_at_ms);
        debug!("{id}: appended at {captured_at_ms}ms, starting location resolution");

        let permission = self.permissions.status(Permission::FineLocation);
        match self.resolver.resolve(id, permission) {
            Ok(ResolveOutcome::Tagged(tag)) => {
                self.store.tag_location(id, tag)?;
            }
            Ok(ResolveOutcome::Subscribed(subscription)) => {
                debug!("{id}: waiting on {subscription}");
            }
            Err(error) => {
                warn!("{id}: location resolution failed: {error}");
                self.store.tag_location(id, LocationTag::Unavailable)?;
            }
        }

        Ok(Some(id))
    }

    /// Handles one location update delivery from the host loop.
    ///
    /// # Returns
    /// The record that received its terminal tag, or `None` for deliveries on
    /// subscriptions that already completed.
    pub fn on_location_update(
        &mut self,
        subscription: SubscriptionId,
        fix: Option<Coordinates>,
    ) -> Result<Option<RecordId>, AppError> {
        let Some((id, tag)) = self.resolver.deliver_update(subscription, fix) else {
            return Ok(None);
        };

        match self.store.tag_location(id, tag)? {
            TagWrite::Applied => Ok(Some(id)),
            TagWrite::AlreadyTerminal => {
                warn!("{id}: delivery arrived after a terminal tag; ignored");
                Ok(None)
            }
        }
    }

    /// Returns the owned record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Returns the number of records still waiting on a location delivery.
    pub fn outstanding_resolutions(&self) -> usize {
        self.resolver.outstanding()
    }
}

/// Checks the runtime kill-switch env var.
///
/// Semantics:
/// - Unset => capture enabled.
/// - `0`, `false`, `off` (case-insensitive) => capture disabled.
/// - Any other value => capture enabled.
pub fn capture_enabled_from_env() -> bool {
    match std::env::var("GEO_SNAP_CAPTURE_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Consolidated runtime status snapshot for simple UI projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether screen and kill-switch gates currently allow capture requests.
    pub capture_allowed: bool,
    /// Currently shown screen as human-readable string.
    pub screen: String,
    /// Number of records in the gallery.
    pub records: usize,
    /// Number of records still waiting on a location delivery.
    pub pending_resolutions: usize,
}

/// Projects UI and coordinator state into a flat status snapshot.
pub fn project_session_status(ui: &UiState, coordinator: &CaptureCoordinator) -> SessionStatus {
    SessionStatus {
        capture_allowed: ui.can_request_capture() && capture_enabled_from_env(),
        screen: format!("{:?}", ui.screen),
        records: coordinator.store().len(),
        pending_resolutions: coordinator.outstanding_resolutions(),
    }
}

/// Deterministic host-loop stand-in for tests and the demo binary.
///
/// The harness fulfills [`PlatformRequest`]s against injected backends, stamps
/// capture times from its own session clock, and drains queued location
/// deliveries in platform-completion order, matching the single-threaded
/// cooperative model of the real host runtime.
pub struct SessionHarness {
    ui: UiState,
    coordinator: CaptureCoordinator,
    camera: Arc<dyn CameraBackend>,
    provider: Arc<SyntheticLocationProvider>,
    permissions: Arc<ScriptedPermissions>,
    prompt_answers: Vec<PermissionDecision>,
    now_ms: u64,
    tick_ms: u64,
}

impl SessionHarness {
    /// Creates a harness over scripted platform services.
    pub fn new(
        camera: Arc<dyn CameraBackend>,
        provider: Arc<SyntheticLocationProvider>,
        permissions: Arc<ScriptedPermissions>,
    ) -> Self {
        let coordinator = CaptureCoordinator::new(
            Arc::clone(&permissions) as Arc<dyn PermissionService>,
            Arc::clone(&provider) as Arc<dyn LocationProvider>,
            UpdateConfig::default(),
        );

        Self {
            ui: UiState::new(app_version()),
            coordinator,
            camera,
            provider,
            permissions,
            prompt_answers: Vec::new(),
            now_ms: 1_000,
            tick_ms: 1_000,
        }
    }

    /// Scripts how the simulated user answers permission prompts.
    ///
    /// Permissions missing from the answers are declined.
    pub fn with_prompt_answers(mut self, answers: Vec<PermissionDecision>) -> Self {
        self.prompt_answers = answers;
        self
    }

    /// Moves the session from the welcome screen to the capture screen.
    pub fn start_session(&mut self) {
        self.ui.start_session();
    }

    /// Runs one user capture request through the full workflow.
    ///
    /// # Returns
    /// The appended record id, or `None` when no record was created (welcome
    /// screen, kill switch, declined permission, or cancelled capture).
    pub fn request_capture(&mut self) -> Result<Option<RecordId>, AppError> {
        if !self.ui.can_request_capture() {
            debug!("capture request ignored outside the capture screen");
            return Ok(None);
        }
        if !capture_enabled_from_env() {
            info!("capture request ignored: disabled by GEO_SNAP_CAPTURE_ENABLED");
            return Ok(None);
        }

        let requests = self.coordinator.on_capture_requested();
        self.dispatch(requests)
    }

    /// Drains queued location deliveries in platform-completion order.
    ///
    /// # Returns
    /// The number of records that received their terminal tag.
    pub fn pump_location_updates(&mut self) -> Result<usize, AppError> {
        let mut tagged = 0;
        while let Some((subscription, fix)) = self.provider.take_pending_delivery() {
            if self
                .coordinator
                .on_location_update(subscription, fix)?
                .is_some()
            {
                tagged += 1;
            }
        }
        Ok(tagged)
    }

    /// Returns the display-ready gallery snapshot.
    pub fn gallery(&self) -> GallerySnapshot {
        gallery_snapshot(self.coordinator.store())
    }

    /// Returns the flat session status projection.
    pub fn status(&self) -> SessionStatus {
        project_session_status(&self.ui, &self.coordinator)
    }

    /// Returns the coordinator for direct assertions.
    pub fn coordinator(&self) -> &CaptureCoordinator {
        &self.coordinator
    }

    fn dispatch(&mut self, requests: Vec<PlatformRequest>) -> Result<Option<RecordId>, AppError> {
        let mut queue = VecDeque::from(requests);
        let mut appended = None;

        while let Some(request) = queue.pop_front() {
            match request {
                PlatformRequest::PromptPermissions(requested) => {
                    let decisions = self.answer_prompt(&requested);
                    queue.extend(self.coordinator.on_permissions_result(&decisions));
                }
                PlatformRequest::LaunchCapture => {
                    let outcome = self.camera.request_capture()?;
                    self.now_ms += self.tick_ms;
                    if let Some(id) = self.coordinator.on_capture_result(outcome, self.now_ms)? {
                        appended = Some(id);
                    }
                }
            }
        }

        Ok(appended)
    }

    fn answer_prompt(&self, requested: &[Permission]) -> Vec<PermissionDecision> {
        let decisions: Vec<PermissionDecision> = requested
            .iter()
            .map(|permission| PermissionDecision {
                permission: *permission,
                status: decision_for(&self.prompt_answers, *permission),
            })
            .collect();

        // Grants become visible to the coordinator's later sync checks.
        for decision in &decisions {
            self.permissions.set_status(decision.permission, decision.status);
        }
        decisions
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera subsystem error.
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Location subsystem error.
    #[error("location error: {0}")]
    Location(#[from] LocationError),
}
