#![warn(missing_docs)]
//! # geo-snap-core
//!
//! ## Purpose
//! Defines the pure data model used across the `geo-snap` workspace.
//!
//! ## Responsibilities
//! - Represent captured photos and their eventual location tags.
//! - Own the append-only capture gallery with explicit record identities.
//! - Enforce the write-once lifecycle of a record's location tag.
//!
//! ## Data flow
//! Camera code emits [`ImageData`] into [`RecordStore::append`], which assigns a
//! [`RecordId`]. The location resolver later finishes the record with exactly one
//! terminal [`LocationTag`] via [`RecordStore::tag_location`].
//!
//! ## Ownership and lifetimes
//! Records own their pixel buffers (`Vec<u8>`) to avoid hidden borrow/lifetime
//! coupling between the capture path and asynchronous resolution callbacks.
//!
//! ## Error model
//! Validation failures (pixel shape mismatch, unknown record id, non-terminal tag
//! writes) return [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate never logs pixel bytes or coordinates. Gallery consumers are given
//! content fingerprints instead of raw image data where possible.
//!
//! ## Example
//! ```rust
//! use geo_snap_core::{Coordinates, ImageData, LocationTag, RecordStore};
//!
//! let mut store = RecordStore::new();
//! let image = ImageData::new(2, 2, vec![0; 16]).expect("valid image shape");
//! let id = store.append(image, 1_000);
//! let tag = LocationTag::Resolved(Coordinates::new(37.0, -122.0));
//! store.tag_location(id, tag).expect("record exists");
//! assert_eq!(store.records()[0].location.display_text(), "Lat: 37.0, Lon: -122.0");
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Canonical schema tag for v1 gallery snapshots.
pub const GALLERY_SCHEMA_VERSION_V1: &str = "v1";

/// Geographic fix reported by the location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Renders the fix as gallery caption text.
    ///
    /// Whole-degree values keep their trailing `.0` (`37.0`, not `37`), matching
    /// the round-trip float representation expected by gallery consumers.
    pub fn display_text(&self) -> String {
        format!("Lat: {:?}, Lon: {:?}", self.latitude, self.longitude)
    }
}

/// Opaque bitmap payload for one captured photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Raw RGBA pixel buffer (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// Constructs a validated image payload.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImageShape`] when the pixel buffer length is
    /// not exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidImageShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Returns a hex-encoded SHA-256 fingerprint over geometry and pixel bytes.
    ///
    /// # Semantics
    /// The fingerprint is a stable content identity handed to gallery consumers
    /// so they can reference a photo without holding its pixel buffer.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_be_bytes());
        hasher.update(self.height.to_be_bytes());
        hasher.update(&self.rgba);
        hex::encode(hasher.finalize())
    }
}

/// Stable identity of one capture record, assigned at append time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(
    /// Zero-based append sequence number.
    pub u64,
);

impl std::fmt::Display for RecordId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "record-{}", self.0)
    }
}

/// Location lifecycle of one capture record.
///
/// `Pending` is the only non-terminal state; every other state is final and is
/// written at most once per record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationTag {
    /// Resolution has not completed yet.
    Pending,
    /// A geographic fix was obtained.
    Resolved(Coordinates),
    /// The location service answered with no fix.
    Unavailable,
    /// Location permission was absent at resolution time.
    Denied,
}

impl LocationTag {
    /// Returns `true` for every state except [`LocationTag::Pending`].
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LocationTag::Pending)
    }

    /// Returns the machine-readable state name used by gallery snapshots.
    pub fn state_name(&self) -> &'static str {
        match self {
            LocationTag::Pending => "pending",
            LocationTag::Resolved(_) => "resolved",
            LocationTag::Unavailable => "unavailable",
            LocationTag::Denied => "denied",
        }
    }

    /// Renders the human-readable caption for this state.
    pub fn display_text(&self) -> String {
        match self {
            LocationTag::Pending => "Location pending".to_string(),
            LocationTag::Resolved(coordinates) => coordinates.display_text(),
            LocationTag::Unavailable => "Location unavailable".to_string(),
            LocationTag::Denied => "Location permission denied".to_string(),
        }
    }

    /// Returns the resolved fix, if any.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            LocationTag::Resolved(coordinates) => Some(*coordinates),
            _ => None,
        }
    }
}

/// One captured photo plus its (eventually resolved) location tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    /// Identity assigned by the owning store.
    pub id: RecordId,
    /// Captured bitmap payload.
    pub image: ImageData,
    /// Capture time in Unix epoch milliseconds, stamped by the host loop.
    pub captured_at_ms: u64,
    /// Current location lifecycle state.
    pub location: LocationTag,
}

/// Result of one terminal tag write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagWrite {
    /// The record moved from `Pending` to the given terminal state.
    Applied,
    /// The record already carried a terminal tag; nothing changed.
    AlreadyTerminal,
}

/// Append-only ordered gallery of capture records.
///
/// Insertion order is capture order is display order. Records are never removed
/// or reordered; the only permitted mutation is one terminal location tag write
/// per record.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<CaptureRecord>,
    next_id: u64,
    revision: u64,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new record with a `Pending` location tag.
    ///
    /// # Returns
    /// The identity assigned to the new record. Callers starting asynchronous
    /// location resolution must carry this id into their completion callbacks
    /// instead of addressing "the latest record".
    pub fn append(&mut self, image: ImageData, captured_at_ms: u64) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.records.push(CaptureRecord {
            id,
            image,
            captured_at_ms,
            location: LocationTag::Pending,
        });
        self.revision += 1;
        id
    }

    /// Writes the terminal location tag of one record.
    ///
    /// # Semantics
    /// The write is idempotent-terminal: the first terminal write is applied, any
    /// later write is reported as [`TagWrite::AlreadyTerminal`] and ignored.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownRecord`] for ids this store never issued.
    /// Returns [`CoreError::NonTerminalTag`] when `tag` is `Pending`.
    pub fn tag_location(&mut self, id: RecordId, tag: LocationTag) -> Result<TagWrite, CoreError> {
        if !tag.is_terminal() {
            return Err(CoreError::NonTerminalTag);
        }

        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(CoreError::UnknownRecord(id))?;

        if record.location.is_terminal() {
            return Ok(TagWrite::AlreadyTerminal);
        }

        record.location = tag;
        self.revision += 1;
        Ok(TagWrite::Applied)
    }

    /// Returns one record by id.
    pub fn get(&self, id: RecordId) -> Option<&CaptureRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Returns all records in capture order.
    pub fn records(&self) -> &[CaptureRecord] {
        &self.records
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no captures happened yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the mutation counter.
    ///
    /// The counter increments on every append and every applied tag write, so
    /// presentation code can detect gallery changes without diffing records.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Error type for core domain validation failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pixel buffer does not match declared geometry.
    #[error("invalid image shape: expected {expected} bytes, got {actual}")]
    InvalidImageShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Declared image dimensions overflow the addressable buffer size.
    #[error("image dimensions overflow")]
    ImageGeometryOverflow,
    /// Record id was never issued by this store.
    #[error("unknown record: {0}")]
    UnknownRecord(RecordId),
    /// Location tags may only be written with terminal states.
    #[error("location tag writes must be terminal")]
    NonTerminalTag,
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or(CoreError::ImageGeometryOverflow)?;

    pixels
        .checked_mul(4)
        .ok_or(CoreError::ImageGeometryOverflow)
}
