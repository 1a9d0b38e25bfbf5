use std::sync::Arc;

use crate::identity::domain::embedding_provider::{EmbeddingError, EmbeddingProvider};
use crate::identity::domain::reference_descriptor::ReferenceDescriptor;
use crate::matching::domain::match_result::MatchResult;
use crate::matching::domain::work_item::WorkItem;
use crate::shared::region::CandidateRegion;

/// Scans candidates against the reference descriptor.
///
/// The first candidate in scan order whose distance is strictly below the
/// threshold wins, even if a later candidate is closer. Candidates whose
/// descriptor cannot be extracted are skipped; they never abort the scan.
pub struct IdentityMatcher {
    reference: ReferenceDescriptor,
    threshold: f64,
    provider: Arc<dyn EmbeddingProvider>,
}

impl IdentityMatcher {
    pub fn new(
        reference: ReferenceDescriptor,
        threshold: f64,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            reference,
            threshold,
            provider,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn find_match(&self, item: &WorkItem) -> MatchResult {
        for candidate in item.candidates() {
            match self.distance(item, candidate) {
                Ok(distance) if distance < self.threshold => {
                    log::debug!(
                        "Frame {}: candidate {candidate} matched at distance {distance:.3}",
                        item.frame().index()
                    );
                    return MatchResult::LockedBox(*candidate);
                }
                Ok(distance) => {
                    log::trace!("Candidate {candidate} rejected at distance {distance:.3}");
                }
                Err(e) => {
                    log::debug!("Skipping candidate {candidate}: {e}");
                }
            }
        }
        MatchResult::NoMatch
    }

    fn distance(&self, item: &WorkItem, candidate: &CandidateRegion) -> Result<f64, EmbeddingError> {
        let descriptor = self.provider.embedding(item.frame(), candidate)?;
        self.reference
            .distance_to(&descriptor)
            .ok_or(EmbeddingError::LengthMismatch {
                expected: self.reference.len(),
                actual: descriptor.len(),
            })
    }
}
