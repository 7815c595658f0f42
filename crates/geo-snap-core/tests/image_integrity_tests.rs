//! Tests image payload validation and caption formatting.

use geo_snap_core::{Coordinates, CoreError, ImageData, LocationTag};

#[test]
fn image_integrity_tests_rejects_mismatched_pixel_buffers() {
    let result = ImageData::new(2, 2, vec![0; 15]);
    assert!(matches!(
        result,
        Err(CoreError::InvalidImageShape {
            expected: 16,
            actual: 15,
        })
    ));
}

#[test]
fn image_integrity_tests_fingerprint_is_stable_and_content_sensitive() {
    let image = ImageData::new(1, 1, vec![1, 2, 3, 4]).expect("image should be valid");
    let same = ImageData::new(1, 1, vec![1, 2, 3, 4]).expect("image should be valid");
    let different = ImageData::new(1, 1, vec![1, 2, 3, 5]).expect("image should be valid");

    assert_eq!(image.fingerprint(), same.fingerprint());
    assert_ne!(image.fingerprint(), different.fingerprint());
    assert_eq!(image.fingerprint().len(), 64);
}

#[test]
fn image_integrity_tests_caption_keeps_whole_degree_suffix() {
    let tag = LocationTag::Resolved(Coordinates::new(37.0, -122.0));
    assert_eq!(tag.display_text(), "Lat: 37.0, Lon: -122.0");

    let fractional = LocationTag::Resolved(Coordinates::new(37.5, -122.25));
    assert_eq!(fractional.display_text(), "Lat: 37.5, Lon: -122.25");
}
