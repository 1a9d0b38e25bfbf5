use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("no usable face geometry in region {0}")]
    NoFaceGeometry(CandidateRegion),
    #[error("region {0} lies outside the frame")]
    OutsideFrame(CandidateRegion),
    #[error("descriptor length {actual} does not match reference length {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("embedding inference failed: {0}")]
    Inference(String),
}

/// Maps an image region to a fixed-length face descriptor.
///
/// Implementations are shared between enrollment and the match worker, so
/// they take `&self` and must be `Send + Sync`.
pub trait EmbeddingProvider: Send + Sync {
    fn embedding(&self, frame: &Frame, region: &CandidateRegion)
        -> Result<Vec<f32>, EmbeddingError>;
}
