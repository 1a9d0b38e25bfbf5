use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes a single still image (the enrollment photo) into an RGB frame.
pub trait StillImageReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
