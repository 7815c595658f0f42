#![warn(missing_docs)]
//! # geo-snap-camera
//!
//! ## Purpose
//! Provides the one-shot camera capture abstraction used by the coordinator.
//!
//! ## Responsibilities
//! - Define a backend-agnostic capture trait modeled on the platform's
//!   image-capture intent (launch, then success-or-cancel result).
//! - Expose a file-roll backend that decodes real image files on desktop hosts.
//! - Expose deterministic synthetic and scripted backends for CI and tests.
//!
//! ## Data flow
//! Host fulfills a launch request -> backend returns [`CaptureOutcome`] ->
//! captured payloads enter the record store as [`geo_snap_core::ImageData`].
//!
//! ## Ownership and lifetimes
//! Captured images are owned values with independent buffers; no borrowed pixel
//! memory escapes backend boundaries.
//!
//! ## Error model
//! Backend and decode failures are reported as [`CameraError`]. A user aborting
//! the capture is not an error; it is the [`CaptureOutcome::Cancelled`] result.
//!
//! ## Security and privacy notes
//! Backends hand pixel buffers to the caller and keep no copies.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use geo_snap_core::ImageData;
use log::debug;
use thiserror::Error;

/// Result of one capture intent round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The user took a photo; the payload is the in-memory bitmap.
    Captured(ImageData),
    /// The user aborted the capture; no photo exists.
    Cancelled,
}

/// Trait implemented by concrete camera providers.
///
/// One call corresponds to one capture intent: the host invokes it when the
/// coordinator asks for a launch and feeds the outcome back as the capture
/// result event.
pub trait CameraBackend: Send + Sync {
    /// Runs one capture round trip.
    ///
    /// # Errors
    /// Returns [`CameraError`] for backend failures. User cancellation is the
    /// `Ok(CaptureOutcome::Cancelled)` case, not an error.
    fn request_capture(&self) -> Result<CaptureOutcome, CameraError>;
}

/// Deterministic synthetic backend for test and CI usage.
///
/// Every capture produces a small solid-color frame whose pixel value advances
/// with an internal sequence, so consecutive captures have distinct
/// fingerprints.
#[derive(Debug)]
pub struct SyntheticCameraBackend {
    width: u32,
    height: u32,
    sequence: Mutex<u64>,
}

impl SyntheticCameraBackend {
    /// Creates a synthetic backend producing 4x4 frames.
    pub fn new() -> Self {
        Self::with_geometry(4, 4)
    }

    /// Creates a synthetic backend with caller-provided frame geometry.
    pub fn with_geometry(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: Mutex::new(0),
        }
    }
}

impl Default for SyntheticCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCameraBackend {
    fn request_capture(&self) -> Result<CaptureOutcome, CameraError> {
        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| CameraError::Backend("synthetic sequence lock poisoned".to_string()))?;
        *sequence += 1;

        let byte = (*sequence % 255) as u8;
        let rgba_len = (self.width as usize) * (self.height as usize) * 4;
        let image = ImageData::new(self.width, self.height, vec![byte; rgba_len])
            .map_err(|error| CameraError::Backend(error.to_string()))?;

        debug!("synthetic capture {} produced {}x{} frame", *sequence, self.width, self.height);
        Ok(CaptureOutcome::Captured(image))
    }
}

/// Scripted backend that replays a fixed queue of capture outcomes.
///
/// Used to exercise cancellation and mixed-session flows deterministically.
#[derive(Debug)]
pub struct ScriptedCameraBackend {
    outcomes: Mutex<Vec<CaptureOutcome>>,
}

impl ScriptedCameraBackend {
    /// Creates a backend replaying `outcomes` in order.
    pub fn new(outcomes: Vec<CaptureOutcome>) -> Self {
        let mut reversed = outcomes;
        reversed.reverse();
        Self {
            outcomes: Mutex::new(reversed),
        }
    }
}

impl CameraBackend for ScriptedCameraBackend {
    fn request_capture(&self) -> Result<CaptureOutcome, CameraError> {
        let mut outcomes = self
            .outcomes
            .lock()
            .map_err(|_| CameraError::Backend("scripted outcome lock poisoned".to_string()))?;
        outcomes.pop().ok_or(CameraError::ScriptExhausted)
    }
}

/// Desktop stand-in backend that serves photos from a directory of image files.
///
/// # Notes
/// The backend snapshots the file list at discovery time and decodes files
/// lazily, one per capture call. An exhausted roll behaves as a cancelled
/// capture rather than an error, mirroring a user backing out of the camera.
#[derive(Debug)]
pub struct FileCameraBackend {
    roll: Vec<PathBuf>,
    cursor: Mutex<usize>,
}

impl FileCameraBackend {
    /// Discovers decodable image files in `directory`, sorted by file name.
    ///
    /// # Errors
    /// Returns [`CameraError::Backend`] when the directory cannot be read.
    /// Returns [`CameraError::EmptyRoll`] when no PNG/JPEG files are present.
    pub fn discover(directory: &Path) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(directory).map_err(|error| {
            CameraError::Backend(format!(
                "unable to read photo roll '{}': {error}",
                directory.display()
            ))
        })?;

        let mut roll = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|error| CameraError::Backend(format!("photo roll entry: {error}")))?;
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|extension| extension.to_str())
                .map(|extension| {
                    matches!(
                        extension.to_ascii_lowercase().as_str(),
                        "png" | "jpg" | "jpeg"
                    )
                })
                .unwrap_or(false);
            if is_image {
                roll.push(path);
            }
        }

        if roll.is_empty() {
            return Err(CameraError::EmptyRoll(directory.display().to_string()));
        }
        roll.sort();

        Ok(Self {
            roll,
            cursor: Mutex::new(0),
        })
    }

    /// Returns the number of photos remaining on the roll.
    pub fn remaining(&self) -> usize {
        let cursor = self
            .cursor
            .lock()
            .map(|cursor| *cursor)
            .unwrap_or(self.roll.len());
        self.roll.len().saturating_sub(cursor)
    }
}

impl CameraBackend for FileCameraBackend {
    fn request_capture(&self) -> Result<CaptureOutcome, CameraError> {
        let path = {
            let mut cursor = self
                .cursor
                .lock()
                .map_err(|_| CameraError::Backend("file roll cursor lock poisoned".to_string()))?;
            let Some(path) = self.roll.get(*cursor) else {
                debug!("photo roll exhausted after {} files", self.roll.len());
                return Ok(CaptureOutcome::Cancelled);
            };
            *cursor += 1;
            path.clone()
        };

        let decoded = image::open(&path)
            .map_err(|error| {
                CameraError::Decode(format!("'{}': {error}", path.display()))
            })?
            .into_rgba8();
        let (width, height) = decoded.dimensions();
        let image = ImageData::new(width, height, decoded.into_raw())
            .map_err(|error| CameraError::Backend(error.to_string()))?;

        debug!("decoded roll photo '{}' at {width}x{height}", path.display());
        Ok(CaptureOutcome::Captured(image))
    }
}

/// Camera layer error type.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
    /// Image file could not be decoded.
    #[error("photo decode failure: {0}")]
    Decode(String),
    /// Photo roll directory contained no usable image files.
    #[error("photo roll '{0}' contains no image files")]
    EmptyRoll(String),
    /// Scripted backend ran out of queued outcomes.
    #[error("scripted camera has no outcomes left")]
    ScriptExhausted,
}

#[cfg(test)]
mod tests {
    //! Unit tests for synthetic and scripted capture behavior.

    use super::*;

    #[test]
    fn synthetic_backend_generates_distinct_frames() {
        let backend = SyntheticCameraBackend::new();
        let first = backend.request_capture().expect("capture should work");
        let second = backend.request_capture().expect("capture should work");

        let (CaptureOutcome::Captured(first), CaptureOutcome::Captured(second)) = (first, second)
        else {
            panic!("synthetic captures should succeed");
        };
        assert_eq!(first.width, 4);
        assert_eq!(first.height, 4);
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn scripted_backend_replays_outcomes_in_order() {
        let image = ImageData::new(1, 1, vec![7, 7, 7, 255]).expect("image should be valid");
        let backend = ScriptedCameraBackend::new(vec![
            CaptureOutcome::Captured(image),
            CaptureOutcome::Cancelled,
        ]);

        assert!(matches!(
            backend.request_capture(),
            Ok(CaptureOutcome::Captured(_))
        ));
        assert!(matches!(
            backend.request_capture(),
            Ok(CaptureOutcome::Cancelled)
        ));
        assert!(matches!(
            backend.request_capture(),
            Err(CameraError::ScriptExhausted)
        ));
    }
}
