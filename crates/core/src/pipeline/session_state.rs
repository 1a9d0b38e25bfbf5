use crate::matching::domain::match_result::MatchResult;
use crate::shared::region::CandidateRegion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Stopped,
}

/// What a `NoMatch` result does to the last known box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StalenessPolicy {
    /// Keep drawing the last box until a new match replaces it.
    Retain,
    /// Drop the box after this many consecutive `NoMatch` results.
    ClearAfterMisses(u32),
}

impl StalenessPolicy {
    pub fn from_misses(stale_after_misses: Option<u32>) -> Self {
        match stale_after_misses {
            Some(n) => StalenessPolicy::ClearAfterMisses(n.max(1)),
            None => StalenessPolicy::Retain,
        }
    }
}

/// How applying a match result changed the locked box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockChange {
    Acquired(CandidateRegion),
    Moved(CandidateRegion),
    Cleared,
    Unchanged,
}

/// Mutable per-session bookkeeping owned by the cadence controller.
#[derive(Debug)]
pub struct SessionState {
    phase: SessionPhase,
    frame_counter: u64,
    last_box: Option<CandidateRegion>,
    consecutive_misses: u32,
    policy: StalenessPolicy,
}

impl SessionState {
    pub fn new(policy: StalenessPolicy) -> Self {
        Self {
            phase: SessionPhase::Idle,
            frame_counter: 0,
            last_box: None,
            consecutive_misses: 0,
            policy,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn last_box(&self) -> Option<CandidateRegion> {
        self.last_box
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }

    /// Idle → Running. Returns false if the session already left Idle.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.phase = SessionPhase::Running;
        true
    }

    /// Stopped is terminal.
    pub fn stop(&mut self) {
        self.phase = SessionPhase::Stopped;
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == SessionPhase::Stopped
    }

    /// Counts one acquired frame and returns the new counter value.
    pub fn advance_frame(&mut self) -> u64 {
        self.frame_counter += 1;
        self.frame_counter
    }

    pub fn apply_result(&mut self, result: MatchResult) -> LockChange {
        match result {
            MatchResult::LockedBox(region) => {
                self.consecutive_misses = 0;
                match self.last_box.replace(region) {
                    None => LockChange::Acquired(region),
                    Some(previous) if previous == region => LockChange::Unchanged,
                    Some(_) => LockChange::Moved(region),
                }
            }
            MatchResult::NoMatch => {
                self.consecutive_misses = self.consecutive_misses.saturating_add(1);
                match self.policy {
                    StalenessPolicy::ClearAfterMisses(n)
                        if self.last_box.is_some() && self.consecutive_misses >= n =>
                    {
                        self.last_box = None;
                        LockChange::Cleared
                    }
                    _ => LockChange::Unchanged,
                }
            }
        }
    }
}
