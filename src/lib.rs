//! Sumi-Tide: a queue-draining page fetcher
//!
//! This crate drains a queue of fetch targets, issues one request per target,
//! accumulates each response body, parses it into a queryable document and
//! reports every stage of a page's life to caller-supplied hooks. Callers can
//! await the moment every queued page has reached a terminal state.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod target;
pub mod transport;

use thiserror::Error;

/// Errors raised while querying documents or moving a page between states
#[derive(Debug, Error)]
pub enum TideError {
    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid queue entry: {0}")]
    InvalidTarget(#[from] TargetError),
}

/// Errors raised while turning a fetch target into request parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Failed to parse address '{address}': {message}")]
    Parse { address: String, message: String },

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in '{0}'")]
    MissingHost(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
}

/// Target queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Cannot pop from an empty target queue")]
    Empty,
}

/// Errors raised by a transport before or while a request is running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Invalid request parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Transport closed the event stream without an end signal")]
    Disconnected,
}

/// Result type alias for Sumi-Tide operations
pub type Result<T> = std::result::Result<T, TideError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for target conversions
pub type TargetResult<T> = std::result::Result<T, TargetError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    CallbackHooks, CrawlOptions, Crawler, Document, DrainReport, FetchError, PageHooks,
};
pub use state::PageState;
pub use target::{inject_headers, FetchTarget, HeaderSet, RequestParams};
pub use transport::{HttpTransport, OperationHandle, ResponseMeta, Transport, TransportEvent};
