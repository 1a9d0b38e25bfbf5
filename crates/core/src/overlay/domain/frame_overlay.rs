use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Draws annotations for the given regions onto a frame in place.
pub trait FrameOverlay: Send {
    fn draw(
        &self,
        frame: &mut Frame,
        regions: &[CandidateRegion],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
