//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a saga execution.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// No events recorded yet.
    #[default]
    NotStarted,

    /// Forward steps are executing.
    Running,

    /// A step failed; completed steps are being undone.
    Compensating,

    /// All steps completed (terminal state).
    Completed,

    /// Saga failed after compensation (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if forward steps may still execute.
    ///
    /// Once compensation begins, no forward step runs again.
    pub fn can_run_steps(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "not_started",
            SagaState::Running => "running",
            SagaState::Compensating => "compensating",
            SagaState::Completed => "completed",
            SagaState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_started() {
        assert_eq!(SagaState::default(), SagaState::NotStarted);
    }

    #[test]
    fn test_only_running_can_run_steps() {
        assert!(!SagaState::NotStarted.can_run_steps());
        assert!(SagaState::Running.can_run_steps());
        assert!(!SagaState::Compensating.can_run_steps());
        assert!(!SagaState::Completed.can_run_steps());
        assert!(!SagaState::Failed.can_run_steps());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SagaState::Running.is_terminal());
        assert!(!SagaState::Compensating.is_terminal());
        assert!(SagaState::Completed.is_terminal());
        assert!(SagaState::Failed.is_terminal());
    }
}
