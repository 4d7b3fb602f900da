use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a batch run
///
/// ```text
/// Idle -> Running -> Completed
///                 -> Cancelled
///                 -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    /// Returns true once the run can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
                | (Self::Running, Self::Failed)
        )
    }

    /// Converts the state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(JobState::Idle.can_transition_to(JobState::Running));
        assert!(JobState::Running.can_transition_to(JobState::Completed));
        assert!(JobState::Running.can_transition_to(JobState::Cancelled));
        assert!(JobState::Running.can_transition_to(JobState::Failed));
        assert!(JobState::Idle.can_transition_to(JobState::Failed));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [JobState::Completed, JobState::Cancelled, JobState::Failed] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(JobState::Running));
            assert!(!terminal.can_transition_to(JobState::Idle));
        }
        assert!(!JobState::Idle.can_transition_to(JobState::Completed));
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in [
            JobState::Idle,
            JobState::Running,
            JobState::Completed,
            JobState::Cancelled,
            JobState::Failed,
        ] {
            assert_eq!(JobState::from_db_string(state.to_db_string()), Some(state));
        }
    }
}
