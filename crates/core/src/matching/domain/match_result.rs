use crate::shared::region::CandidateRegion;

/// Outcome of one matching pass over a work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchResult {
    /// The region believed to contain the tracked identity.
    LockedBox(CandidateRegion),
    NoMatch,
}

