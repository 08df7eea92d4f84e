//! Core types for the search library.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The outcome of evaluating one candidate across all folds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CandidateState {
    /// Every fold was fitted and scored.
    Complete,
    /// At least one fold failed to fit or score.
    Failed,
}

impl CandidateState {
    /// Returns the state name as it appears in exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateState::Complete => "Complete",
            CandidateState::Failed => "Failed",
        }
    }
}
