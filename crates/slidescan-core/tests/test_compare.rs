mod common;

use image::Rgb;
use slidescan_core::compare::{ImageComparator, MeanAbsoluteComparator, Rating};

use common::{block_noise, solid};

#[test]
fn test_identical_images_score_full() {
    let img = block_noise(64, 48, 3);
    let similarity = MeanAbsoluteComparator.compare(&img, &img);
    assert_eq!(similarity.score, 100.0);
    assert_eq!(similarity.rating(), Rating::Excellent);
    assert!(similarity.diff.pixels().all(|p| p.0 == [0, 0, 0]));
}

#[test]
fn test_opposite_images_score_zero() {
    let black = solid(16, 16, [0, 0, 0]);
    let white = solid(16, 16, [255, 255, 255]);
    let similarity = MeanAbsoluteComparator.compare(&black, &white);
    assert_eq!(similarity.score, 0.0);
    assert_eq!(similarity.rating(), Rating::Poor);
}

#[test]
fn test_score_is_mean_absolute_difference() {
    let reference = solid(10, 10, [100, 100, 100]);
    let candidate = solid(10, 10, [151, 100, 49]);
    // mean |diff| = (51 + 0 + 51) / 3 = 34
    let similarity = MeanAbsoluteComparator.compare(&reference, &candidate);
    let expected = 100.0 * (1.0 - 34.0 / 255.0);
    assert!((similarity.score - expected).abs() < 1e-9);
    assert_eq!(similarity.diff.get_pixel(3, 3), &Rgb([51, 0, 51]));
}

#[test]
fn test_candidate_is_resized_to_reference() {
    let reference = solid(40, 30, [80, 120, 160]);
    let candidate = solid(80, 60, [80, 120, 160]);
    let similarity = MeanAbsoluteComparator.compare(&reference, &candidate);
    assert_eq!(similarity.diff.dimensions(), (40, 30));
    assert!(similarity.score > 99.0);
}

#[test]
fn test_rating_thresholds() {
    assert_eq!(Rating::from_score(99.0), Rating::Excellent);
    assert_eq!(Rating::from_score(95.0), Rating::Good);
    assert_eq!(Rating::from_score(85.5), Rating::Good);
    assert_eq!(Rating::from_score(85.0), Rating::Fair);
    assert_eq!(Rating::from_score(70.1), Rating::Fair);
    assert_eq!(Rating::from_score(70.0), Rating::Poor);
    assert_eq!(Rating::Good.to_string(), "Good");
}
