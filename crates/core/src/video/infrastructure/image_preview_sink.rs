use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::display_sink::DisplaySink;

/// Default bounding box for the preview image.
pub const DEFAULT_PREVIEW_SIZE: (u32, u32) = (960, 540);

/// Display sink that overwrites a preview image file on every publish.
///
/// The frame is scaled down to fit `max_size` keeping its aspect ratio;
/// smaller frames are written at native size. The file is written to a
/// sibling temp path and renamed so viewers never see a partial image.
pub struct ImagePreviewSink {
    path: PathBuf,
    max_size: (u32, u32),
    published: usize,
}

impl ImagePreviewSink {
    pub fn new(path: &Path, max_size: (u32, u32)) -> Self {
        Self {
            path: path.to_path_buf(),
            max_size,
            published: 0,
        }
    }

    pub fn published(&self) -> usize {
        self.published
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(".partial.");
        name.push(
            self.path
                .extension()
                .map(|e| e.to_os_string())
                .unwrap_or_else(|| "png".into()),
        );
        self.path.with_file_name(name)
    }
}

impl DisplaySink for ImagePreviewSink {
    fn publish(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        let (w, h) = fit_within(frame.width(), frame.height(), self.max_size);
        let img = if (w, h) != (frame.width(), frame.height()) {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        } else {
            img
        };

        let temp = self.temp_path();
        img.save(&temp)?;
        std::fs::rename(&temp, &self.path)?;
        self.published += 1;
        Ok(())
    }
}

/// Largest size with the source aspect ratio that fits inside `max`.
/// Never upscales; each side is at least one pixel.
fn fit_within(width: u32, height: u32, max: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = max;
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}
