//! Per-page failures and the end-of-drain report

use crate::{TargetError, TransportError};
use thiserror::Error;

/// Why a single page failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Could not resolve {target}: {source}")]
    Target { target: String, source: TargetError },

    #[error("Could not open {target}: {source}")]
    Open { target: String, source: TransportError },

    #[error("Transport failed for {target}: {source}")]
    Transport { target: String, source: TransportError },

    #[error("Processing of {target} stopped before reaching a terminal state")]
    Aborted { target: String },
}

impl FetchError {
    /// The target the failure belongs to
    pub fn target(&self) -> &str {
        match self {
            Self::Target { target, .. }
            | Self::Open { target, .. }
            | Self::Transport { target, .. }
            | Self::Aborted { target } => target,
        }
    }
}

/// Summary of a drain, delivered when the completion signal fires
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Targets popped from the queue
    pub dispatched: usize,

    /// Pages that reached `Complete`
    pub completed: usize,

    /// Pages that reached `Failed`
    pub failed: usize,

    /// One entry per failed page, in the order failures happened
    pub errors: Vec<FetchError>,
}

impl DrainReport {
    /// Returns true if no page failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    /// Pages that reached a terminal state
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}
