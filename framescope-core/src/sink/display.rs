//! Display sinks receiving the raw decoded image of every frame.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::error::{CoreError, CoreResult};
use crate::utils::scaled_width;

/// What the stream processor should do after presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayControl {
    Continue,
    Abort,
}

/// Receives every decoded image; may request the run to stop.
pub trait DisplaySink<I> {
    fn present(&mut self, frame_n: u64, image: &I) -> CoreResult<DisplayControl>;
}

/// Display that shows nothing and never aborts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl<I> DisplaySink<I> for NullDisplay {
    fn present(&mut self, _frame_n: u64, _image: &I) -> CoreResult<DisplayControl> {
        Ok(DisplayControl::Continue)
    }
}

/// Keeps a scaled PNG preview of the most recent frame on disk.
///
/// The preview is `height` pixels high and keeps the aspect ratio, its width
/// rounded up. It is rewritten every `interval` frames.
#[derive(Debug, Clone)]
pub struct PreviewWriter {
    path: PathBuf,
    height: u32,
    interval: u64,
}

impl PreviewWriter {
    pub fn new(path: impl Into<PathBuf>, height: u32) -> Self {
        Self {
            path: path.into(),
            height: height.max(1),
            interval: 1,
        }
    }

    /// Only rewrite the preview on every `interval`-th frame.
    pub fn every(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySink<RgbaImage> for PreviewWriter {
    fn present(&mut self, frame_n: u64, image: &RgbaImage) -> CoreResult<DisplayControl> {
        if frame_n % self.interval != 0 {
            return Ok(DisplayControl::Continue);
        }

        let (width, height) = image.dimensions();
        let new_width = scaled_width(width, height, self.height).max(1);
        let preview = imageops::resize(image, new_width, self.height, FilterType::Triangle);
        preview.save(&self.path).map_err(|e| {
            CoreError::Image(format!("Failed to write preview {}: {e}", self.path.display()))
        })?;

        log::trace!("Preview of frame {frame_n} written to {}", self.path.display());
        Ok(DisplayControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    #[test]
    fn test_preview_is_scaled_to_height() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.png");
        let mut writer = PreviewWriter::new(&path, 36);

        let image = RgbaImage::from_pixel(192, 108, Rgba([10, 20, 30, 255]));
        assert_eq!(writer.present(0, &image).unwrap(), DisplayControl::Continue);

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (64, 36));
    }

    #[test]
    fn test_interval_skips_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.png");
        let mut writer = PreviewWriter::new(&path, 10).every(5);

        let image = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        writer.present(3, &image).unwrap();
        assert!(!path.exists());
        writer.present(5, &image).unwrap();
        assert!(path.exists());
    }
}
