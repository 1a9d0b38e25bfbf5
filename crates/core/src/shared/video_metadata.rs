use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; 0 when unknown (e.g. live capture).
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Native frame interval, or `None` when the source reports no rate.
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.fps > 0.0 && self.fps.is_finite() {
            Some(Duration::from_secs_f64(1.0 / self.fps))
        } else {
            None
        }
    }
}
