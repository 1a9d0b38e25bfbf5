use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Domain interface for the general-purpose object detector.
///
/// Returns candidate regions whose predicted class is in `class_filter`.
/// Detection is advisory: callers treat an error as "no candidates".
/// Implementations may keep per-session state, hence `&mut self`.
pub trait CandidateDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        class_filter: &[u32],
    ) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>>;
}
