//! Page state definitions for tracking a target through its fetch
use crate::TideError;
use std::fmt;

/// Represents the current state of a page in its fetch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Target is waiting in the queue
    Pending,

    /// Request has been handed to the transport
    Dispatched,

    /// Response status and headers have arrived
    HeadersReceived,

    // ===== Terminal States =====
    /// Body fully received, parsed and reported
    Complete,

    /// Request could not be started or the transport reported an error
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the page finished successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns true if a move from `self` to `next` is legal
    ///
    /// `Failed` is reachable from every active state. A page with no response
    /// head may still complete, since the transport contract allows zero
    /// header events.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;
        matches!(
            (self, next),
            (Pending, Dispatched)
                | (Dispatched, HeadersReceived)
                | (Dispatched, Complete)
                | (HeadersReceived, Complete)
                | (Pending, Failed)
                | (Dispatched, Failed)
                | (HeadersReceived, Failed)
        )
    }

    /// Returns the next state, or an error if the transition is illegal
    pub fn transition(self, next: PageState) -> Result<PageState, TideError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TideError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::HeadersReceived => "headers_received",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Dispatched,
            Self::HeadersReceived,
            Self::Complete,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
