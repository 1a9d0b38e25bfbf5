use crate::shared::frame::Frame;
use crate::shared::region::CandidateRegion;

/// An owned frame snapshot paired with the candidates detected on it.
///
/// Immutable once handed to the match worker.
#[derive(Debug)]
pub struct WorkItem {
    frame: Frame,
    candidates: Vec<CandidateRegion>,
}

impl WorkItem {
    pub fn new(frame: Frame, candidates: Vec<CandidateRegion>) -> Self {
        Self { frame, candidates }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn candidates(&self) -> &[CandidateRegion] {
        &self.candidates
    }
}
