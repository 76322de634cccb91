use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::info;

use crate::error::{Result, SlideScanError};

/// A stream of raw frames. `Ok(None)` marks the end of the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Number of frames remaining, if known.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// Replays the images of a directory in file-name order.
///
/// JPEG files are used when present, otherwise PNG files.
pub struct DirectorySource {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut files = list_with_extension(dir, &["jpg", "jpeg"])?;
        if files.is_empty() {
            files = list_with_extension(dir, &["png"])?;
        }
        if files.is_empty() {
            return Err(SlideScanError::NoFrames(dir.to_path_buf()));
        }
        info!(dir = %dir.display(), frames = files.len(), "Opened frame directory");
        Ok(Self { files, next: 0 })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(image::open(path)?.to_rgb8()))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.files.len() - self.next)
    }
}

/// In-memory frames, mostly useful for driving a session from tests.
pub struct VecSource {
    frames: std::vec::IntoIter<RgbImage>,
}

impl VecSource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl FrameSource for VecSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.next())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

fn list_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect();
    files.sort();
    Ok(files)
}
