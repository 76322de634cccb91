mod common;

use image::Rgb;
use slidescan_core::error::SlideScanError;
use slidescan_core::io::source::{DirectorySource, FrameSource};
use tempfile::TempDir;

use common::{solid, write_image};

#[test]
fn test_frames_replay_in_name_order() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("frame_002.jpg"), &solid(8, 8, [200, 200, 200]));
    write_image(&dir.path().join("frame_001.jpg"), &solid(8, 8, [10, 10, 10]));

    let mut source = DirectorySource::open(dir.path()).unwrap();
    assert_eq!(source.len_hint(), Some(2));
    let first = source.next_frame().unwrap().unwrap();
    assert!(first.get_pixel(4, 4).0[0] < 50);
    assert_eq!(source.len_hint(), Some(1));
    assert!(source.next_frame().unwrap().is_some());
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn test_jpeg_frames_take_precedence_over_png() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("b.jpg"), &solid(8, 8, [0, 0, 0]));
    solid(8, 8, [0, 0, 0]).save(dir.path().join("a.png")).unwrap();

    let source = DirectorySource::open(dir.path()).unwrap();
    assert_eq!(source.files(), &[dir.path().join("b.jpg")]);
}

#[test]
fn test_png_frames_are_used_without_jpeg() {
    let dir = TempDir::new().unwrap();
    let frame = solid(6, 4, [1, 2, 3]);
    frame.save(dir.path().join("only.png")).unwrap();

    let mut source = DirectorySource::open(dir.path()).unwrap();
    let loaded = source.next_frame().unwrap().unwrap();
    assert_eq!(loaded.get_pixel(0, 0), &Rgb([1, 2, 3]));
}

#[test]
fn test_empty_directory_has_no_frames() {
    let dir = TempDir::new().unwrap();
    let err = DirectorySource::open(dir.path()).err().unwrap();
    assert!(matches!(err, SlideScanError::NoFrames(_)));
}
