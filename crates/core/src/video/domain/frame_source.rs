use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Supplies frames to the acquisition loop, one per call.
///
/// `next_frame` returns `Ok(None)` at end of stream. Any error is treated
/// as terminal by the caller.
pub trait FrameSource: Send {
    /// Opens a video source and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases any resources held by the source. Safe to call twice.
    fn close(&mut self);
}
