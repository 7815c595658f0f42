#![warn(missing_docs)]
//! # geo-snap-ui
//!
//! ## Purpose
//! Defines the UI-facing state model and gallery projection for `geo-snap`.
//!
//! ## Responsibilities
//! - Represent the welcome/capture screen flow.
//! - Project the record store into display-safe gallery snapshots.
//! - Expose the guard check for whether capture requests are meaningful.
//!
//! ## Data flow
//! Orchestration events mutate [`UiState`]; the presentation layer pulls
//! [`GallerySnapshot`] values keyed by store revision to re-render the grid.
//!
//! ## Ownership and lifetimes
//! Snapshots own all their strings and carry image fingerprints instead of
//! pixel buffers, so rendering state never borrows from the record store.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Projection is
//! total over every record state.
//!
//! ## Security and privacy notes
//! Snapshots expose captions, geometry, and fingerprints; raw pixel bytes stay
//! inside the record store.

use geo_snap_core::{
    Coordinates, GALLERY_SCHEMA_VERSION_V1, RecordId, RecordStore,
};
use serde::{Deserialize, Serialize};

/// Screen the session currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Landing screen shown before the session starts.
    Welcome,
    /// Capture screen with the photo grid.
    Capture,
}

/// Aggregate UI runtime state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Currently shown screen.
    pub screen: Screen,
}

impl UiState {
    /// Creates default UI state on the welcome screen.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            screen: Screen::Welcome,
        }
    }

    /// Moves the session to the capture screen.
    pub fn start_session(&mut self) {
        self.screen = Screen::Capture;
    }

    /// Returns `true` when capture requests are meaningful.
    pub fn can_request_capture(&self) -> bool {
        self.screen == Screen::Capture
    }
}

/// One row of the rendered photo grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Identity of the backing record.
    pub record_id: RecordId,
    /// Hex SHA-256 fingerprint of the photo content.
    pub fingerprint: String,
    /// Photo width in pixels.
    pub width: u32,
    /// Photo height in pixels.
    pub height: u32,
    /// Capture time in Unix epoch milliseconds.
    pub captured_at_ms: u64,
    /// Machine-readable location state (`pending`, `resolved`, `unavailable`,
    /// `denied`).
    pub location_state: String,
    /// Resolved fix, when `location_state` is `resolved`.
    pub coordinates: Option<Coordinates>,
    /// Caption text rendered under the photo.
    pub caption: String,
}

/// Versioned, display-ready view of the whole gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GallerySnapshot {
    /// Snapshot schema version for presentation-contract checks.
    pub schema_version: String,
    /// Store revision this snapshot was taken at.
    pub revision: u64,
    /// Entries in capture order.
    pub entries: Vec<GalleryEntry>,
}

/// Projects the record store into a display-ready snapshot.
pub fn gallery_snapshot(store: &RecordStore) -> GallerySnapshot {
    let entries = store
        .records()
        .iter()
        .map(|record| GalleryEntry {
            record_id: record.id,
            fingerprint: record.image.fingerprint(),
            width: record.image.width,
            height: record.image.height,
            captured_at_ms: record.captured_at_ms,
            location_state: record.location.state_name().to_string(),
            coordinates: record.location.coordinates(),
            caption: record.location.display_text(),
        })
        .collect();

    GallerySnapshot {
        schema_version: GALLERY_SCHEMA_VERSION_V1.to_string(),
        revision: store.revision(),
        entries,
    }
}
