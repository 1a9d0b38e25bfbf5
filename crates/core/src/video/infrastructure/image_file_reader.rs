use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::still_image_reader::StillImageReader;

/// Reads still images with the `image` crate, converting to packed RGB.
///
/// Alpha and grayscale inputs are flattened to three channels.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StillImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)
            .map_err(|e| format!("Cannot read image {}: {e}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("Image {} is empty", path.display()).into());
        }
        Ok(Frame::new(img.into_raw(), width, height, 3, 0))
    }
}
