//! Page lifecycle hooks
//!
//! Hooks are plain synchronous callbacks. The crawler calls them at fixed
//! points of every page's lifecycle and ignores whatever they do: a hook that
//! starts background work is not awaited, and a hook that panics is logged
//! and otherwise ignored.

use super::engine::Crawler;
use super::parser::Document;
use super::report::FetchError;
use crate::state::PageState;
use crate::target::FetchTarget;
use crate::transport::{OperationHandle, ResponseMeta};

/// Passed to [`PageHooks::before_page`] right after the request is opened
pub struct BeforeContext<'a> {
    pub crawler: &'a Crawler,
    pub target: &'a FetchTarget,
    pub operation: &'a OperationHandle,
}

/// Passed to [`PageHooks::page_response`] once the response head arrives
pub struct ResponseContext<'a> {
    pub crawler: &'a Crawler,
    pub target: &'a FetchTarget,
    pub operation: &'a OperationHandle,
    pub response: &'a ResponseMeta,
}

/// Passed to [`PageHooks::page_complete`] after the body was received and parsed
pub struct CompleteContext<'a> {
    pub crawler: &'a Crawler,
    pub target: &'a FetchTarget,
    pub operation: &'a OperationHandle,
    /// Absent only if the transport ended the stream without a response head
    pub response: Option<&'a ResponseMeta>,
    pub document: &'a Document,
    pub body: &'a [u8],
}

/// Passed to [`PageHooks::page_error`] when a page fails
pub struct ErrorContext<'a> {
    pub crawler: &'a Crawler,
    pub target: &'a FetchTarget,
    /// Absent if the request never got opened
    pub operation: Option<&'a OperationHandle>,
    pub response: Option<&'a ResponseMeta>,
    /// State the page was in when it failed
    pub state: PageState,
    pub error: &'a FetchError,
}

/// Callbacks invoked over a page's lifecycle
///
/// Every method defaults to a no-op, so implementors override only what they need.
pub trait PageHooks: Send + Sync {
    /// The request was opened; nothing has been received yet
    fn before_page(&self, _ctx: &BeforeContext<'_>) {}

    /// Status and headers arrived; called at most once per page
    fn page_response(&self, _ctx: &ResponseContext<'_>) {}

    /// The whole body arrived and was parsed
    fn page_complete(&self, _ctx: &CompleteContext<'_>) {}

    /// The page could not be fetched
    fn page_error(&self, _ctx: &ErrorContext<'_>) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl PageHooks for NoopHooks {}

type BeforeFn = Box<dyn Fn(&BeforeContext<'_>) + Send + Sync>;
type ResponseFn = Box<dyn Fn(&ResponseContext<'_>) + Send + Sync>;
type CompleteFn = Box<dyn Fn(&CompleteContext<'_>) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&ErrorContext<'_>) + Send + Sync>;

/// [`PageHooks`] assembled from closures
///
/// # Example
///
/// ```
/// use sumi_tide::crawler::CallbackHooks;
///
/// let hooks = CallbackHooks::new()
///     .on_complete(|ctx| println!("{} -> {} bytes", ctx.target, ctx.body.len()))
///     .on_error(|ctx| eprintln!("{}", ctx.error));
/// ```
#[derive(Default)]
pub struct CallbackHooks {
    before: Option<BeforeFn>,
    response: Option<ResponseFn>,
    complete: Option<CompleteFn>,
    error: Option<ErrorFn>,
}

impl CallbackHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&BeforeContext<'_>) + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseContext<'_>) + Send + Sync + 'static,
    {
        self.response = Some(Box::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&CompleteContext<'_>) + Send + Sync + 'static,
    {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ErrorContext<'_>) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }
}

impl PageHooks for CallbackHooks {
    fn before_page(&self, ctx: &BeforeContext<'_>) {
        if let Some(f) = &self.before {
            f(ctx);
        }
    }

    fn page_response(&self, ctx: &ResponseContext<'_>) {
        if let Some(f) = &self.response {
            f(ctx);
        }
    }

    fn page_complete(&self, ctx: &CompleteContext<'_>) {
        if let Some(f) = &self.complete {
            f(ctx);
        }
    }

    fn page_error(&self, ctx: &ErrorContext<'_>) {
        if let Some(f) = &self.error {
            f(ctx);
        }
    }
}
