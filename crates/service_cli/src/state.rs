//! Run lifecycle.
//!
//! ```text
//! Pending -> Generating -> Writing -> Completed
//!    \___________\____________\_____> Failed
//! ```
//!
//! `Completed` and `Failed` are terminal. There is no partial success:
//! batches or files already durable when a run fails do not change its
//! outcome.

use crate::error::{ErrorKind, Result, RunError};
use std::fmt;

/// First error of a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Failure category
    pub kind: ErrorKind,
    /// Rendered error
    pub message: String,
}

impl From<&RunError> for RunFailure {
    fn from(err: &RunError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// State of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started
    #[default]
    Pending,
    /// Assembling the dataset
    Generating,
    /// Uploading or exporting
    Writing,
    /// Every stage or file succeeded
    Completed,
    /// Stopped at the first error
    Failed(RunFailure),
}

impl RunState {
    /// State name for display
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Pending => "Pending",
            RunState::Generating => "Generating",
            RunState::Writing => "Writing",
            RunState::Completed => "Completed",
            RunState::Failed(_) => "Failed",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }

    /// Move to `next`, rejecting anything but the forward path or a failure
    /// from a live state.
    pub fn transition(&mut self, next: RunState) -> Result<()> {
        let allowed = matches!(
            (&*self, &next),
            (RunState::Pending, RunState::Generating)
                | (RunState::Generating, RunState::Writing)
                | (RunState::Writing, RunState::Completed)
        ) || (!self.is_terminal() && matches!(next, RunState::Failed(_)));

        if !allowed {
            return Err(RunError::InvalidTransition {
                from: self.name(),
                to: next.name(),
            });
        }
        *self = next;
        Ok(())
    }

    /// Record `err` as the run's failure. Ignored once terminal, so the
    /// first error is the one kept.
    pub fn fail(&mut self, err: &RunError) {
        if !self.is_terminal() {
            *self = RunState::Failed(RunFailure::from(err));
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Failed(failure) => write!(f, "Failed ({}: {})", failure.kind, failure.message),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synth_core::error::SynthError;

    #[test]
    fn test_forward_path() {
        let mut state = RunState::default();
        state.transition(RunState::Generating).unwrap();
        state.transition(RunState::Writing).unwrap();
        state.transition(RunState::Completed).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let mut state = RunState::Pending;
        let err = state.transition(RunState::Writing).unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidTransition {
                from: "Pending",
                to: "Writing"
            }
        ));
        assert_eq!(state, RunState::Pending);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut state = RunState::Completed;
        assert!(state.transition(RunState::Generating).is_err());
        state.fail(&RunError::from(SynthError::invalid_argument("late")));
        assert_eq!(state, RunState::Completed);
    }

    #[test]
    fn test_failed_keeps_first_error() {
        let mut state = RunState::Generating;
        state.fail(&RunError::from(SynthError::invalid_argument("first")));
        state.fail(&RunError::from(SynthError::invalid_argument("second")));
        match &state {
            RunState::Failed(failure) => {
                assert_eq!(failure.kind, ErrorKind::InvalidArgument);
                assert!(failure.message.contains("first"));
            }
            other => panic!("Expected failed state, got {:?}", other),
        }
        assert!(state.to_string().starts_with("Failed (InvalidArgument"));
    }
}
