//! Crawl run state definitions
//!
//! This module defines the lifecycle of a single crawl run and the transitions
//! the coordinator is allowed to make between states.

use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Initial State =====
    /// Coordinator has been built but no worker has started
    Idle,

    // ===== Active State =====
    /// Workers are draining the frontier
    Running,

    // ===== Terminal States =====
    /// Frontier emptied with nothing in flight
    Completed,

    /// An external cancellation was observed; in-flight pages finished
    Stopped,

    /// A worker task aborted; records gathered so far are kept
    Failed,
}

impl CrawlState {
    /// Returns true if this is a terminal state (the run is over)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    /// Returns true if a transition from `self` to `next` is allowed
    ///
    /// `Idle -> Running`, `Idle -> Stopped` (cancelled before start) and
    /// `Running -> {Completed, Stopped, Failed}` are the only legal moves.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Stopped)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Stopped)
                | (Self::Running, Self::Failed)
        )
    }

    /// Returns the lowercase label used in logs and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!CrawlState::Idle.is_terminal());
        assert!(!CrawlState::Running.is_terminal());

        assert!(CrawlState::Completed.is_terminal());
        assert!(CrawlState::Stopped.is_terminal());
        assert!(CrawlState::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(CrawlState::Idle.can_transition_to(CrawlState::Running));
        assert!(CrawlState::Idle.can_transition_to(CrawlState::Stopped));
        assert!(CrawlState::Running.can_transition_to(CrawlState::Completed));
        assert!(CrawlState::Running.can_transition_to(CrawlState::Stopped));
        assert!(CrawlState::Running.can_transition_to(CrawlState::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlState::Idle.can_transition_to(CrawlState::Completed));
        assert!(!CrawlState::Running.can_transition_to(CrawlState::Idle));
        assert!(!CrawlState::Completed.can_transition_to(CrawlState::Running));
        assert!(!CrawlState::Stopped.can_transition_to(CrawlState::Running));
        assert!(!CrawlState::Failed.can_transition_to(CrawlState::Completed));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlState::Idle), "idle");
        assert_eq!(format!("{}", CrawlState::Completed), "completed");
        assert_eq!(format!("{}", CrawlState::Stopped), "stopped");
    }
}
