use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// Finds faces in an image.
///
/// Results are ordered by descending confidence, so the first entry is
/// the most likely face. Shared across threads, hence `&self` and `Sync`.
pub trait FaceLocator: Send + Sync {
    fn locate(&self, frame: &Frame) -> Result<Vec<CandidateRegion>, Box<dyn std::error::Error>>;
}
