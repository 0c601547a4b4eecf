//! Queue-draining crawler
//!
//! The [`Crawler`] owns the target queue, the in-flight counter and the
//! completion signal. `run` starts a drain task that pops targets front to
//! back, opens one operation per target and hands each operation to its own
//! task, yielding between targets so operations already running can make
//! progress. Draining does not wait for operations to finish; unless a
//! concurrency limit is configured, every queued target is in flight at once.
//!
//! The in-flight counter goes up when a target is popped and comes down
//! exactly once when that target reaches a terminal state, whether it
//! completed, failed to open, failed in the transport, or its task was torn
//! down. The completion signal fires once the queue is empty, nothing is in
//! flight, and someone has asked for it via [`Crawler::end`].

use super::accumulator::ResponseAccumulator;
use super::hooks::{BeforeContext, CompleteContext, ErrorContext, NoopHooks, PageHooks, ResponseContext};
use super::parser::Document;
use super::queue::TargetQueue;
use super::report::{DrainReport, FetchError};
use crate::state::PageState;
use crate::target::{inject_headers, FetchTarget, HeaderSet};
use crate::transport::{OperationHandle, ResponseMeta, Transport, TransportEvent};
use crate::{Result, TransportError};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

/// Construction-time options for a [`Crawler`]
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use sumi_tide::crawler::{CallbackHooks, CrawlOptions};
/// use sumi_tide::FetchTarget;
///
/// let options = CrawlOptions {
///     queue: vec![FetchTarget::from("https://example.com/")],
///     hooks: Arc::new(CallbackHooks::new().on_complete(|ctx| {
///         println!("{:?}", ctx.document.title());
///     })),
///     ..Default::default()
/// };
/// ```
pub struct CrawlOptions {
    /// Initial targets, fetched in order
    pub queue: Vec<FetchTarget>,

    /// Headers merged into every request, overriding per-target headers
    pub headers: Option<HeaderSet>,

    /// Lifecycle callbacks
    pub hooks: Arc<dyn PageHooks>,

    /// Maximum number of operations in flight at once; unbounded when `None`
    pub max_concurrency: Option<usize>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            headers: None,
            hooks: Arc::new(NoopHooks),
            max_concurrency: None,
        }
    }
}

#[derive(Debug, Default)]
struct DrainState {
    queue: TargetQueue,
    in_flight: usize,
    /// `run` has been called at least once
    started: bool,
    /// A drain task is currently alive
    draining: bool,
    /// `end` has been called
    completion_requested: bool,
    /// The completion signal has fired
    completed: bool,
    report: DrainReport,
}

struct Inner {
    headers: Option<HeaderSet>,
    hooks: Arc<dyn PageHooks>,
    transport: Arc<dyn Transport>,
    limiter: Option<Arc<Semaphore>>,
    state: Mutex<DrainState>,
    done: watch::Sender<bool>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, DrainState> {
        // Hooks run outside the lock, so a poisoned lock still holds consistent counters
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn evaluate_completion(&self, state: &mut DrainState) {
        if state.completion_requested
            && !state.completed
            && !state.queue.has_items()
            && state.in_flight == 0
        {
            state.completed = true;
            tracing::info!(
                "Queue drained: {} dispatched, {} completed, {} failed",
                state.report.dispatched,
                state.report.completed,
                state.report.failed
            );
            self.done.send_replace(true);
        }
    }
}

/// Tracks one popped target's state and releases its in-flight slot when dropped
///
/// Created right after the counter is incremented, so every increment is
/// paired with exactly one decrement however the operation ends. A guard
/// dropped before its page reached a terminal state counts as aborted.
struct InFlightGuard {
    inner: Arc<Inner>,
    target: String,
    page: PageState,
}

impl InFlightGuard {
    fn new(inner: Arc<Inner>, target: String) -> Self {
        Self {
            inner,
            target,
            page: PageState::Pending,
        }
    }

    fn page(&self) -> PageState {
        self.page
    }

    fn advance(&mut self, next: PageState) -> Result<()> {
        self.page = self.page.transition(next)?;
        Ok(())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();

        match self.page {
            PageState::Complete => state.report.completed += 1,
            PageState::Failed => state.report.failed += 1,
            active => {
                tracing::warn!("Operation for {} dropped while {}", self.target, active);
                state.report.failed += 1;
                state.report.errors.push(FetchError::Aborted {
                    target: self.target.clone(),
                });
            }
        }

        debug_assert!(state.in_flight > 0, "in-flight counter underflow");
        state.in_flight = state.in_flight.saturating_sub(1);
        self.inner.evaluate_completion(&mut state);
    }
}

fn call_hook(name: &str, target: &FetchTarget, hook: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
        tracing::error!("Hook {} panicked while handling {}", name, target);
    }
}

/// Drains a queue of fetch targets through a [`Transport`]
///
/// Cloning is cheap; clones share the same queue and counters.
#[derive(Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

impl Crawler {
    /// Creates a crawler; nothing is fetched until [`run`](Self::run)
    pub fn new(options: CrawlOptions, transport: Arc<dyn Transport>) -> Self {
        let (done, _) = watch::channel(false);
        let limiter = options
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        let state = DrainState {
            queue: TargetQueue::new(options.queue),
            ..Default::default()
        };

        Self {
            inner: Arc::new(Inner {
                headers: options.headers,
                hooks: options.hooks,
                transport,
                limiter,
                state: Mutex::new(state),
                done,
            }),
        }
    }

    /// Starts draining the queue and returns the crawler
    ///
    /// Calling `run` while a drain is already underway does nothing.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self) -> &Self {
        let spawn = {
            let mut state = self.inner.lock_state();
            state.started = true;
            let spawn = !state.draining && state.queue.has_items();
            if spawn {
                state.draining = true;
            }
            spawn
        };

        if spawn {
            tracing::info!("Draining {} queued targets", self.queued());
            tokio::spawn(self.clone().drain());
        }

        self
    }

    /// Appends a target to the queue
    ///
    /// If `run` was called before and the drain has since gone idle, draining
    /// restarts. Targets enqueued from a hook are queued before that page
    /// releases its in-flight slot, so completion cannot fire in between.
    ///
    /// Enqueueing after the completion signal has fired re-arms it: futures
    /// from a later [`end`](Self::end) wait for the new targets to finish.
    pub fn enqueue(&self, target: impl Into<FetchTarget>) {
        let restart = {
            let mut state = self.inner.lock_state();
            state.queue.push(target.into());
            if state.completed {
                // Re-arm for the next drain; a pending `end` keeps waiting on it
                state.completed = false;
                self.inner.done.send_replace(false);
            }
            let restart = state.started && !state.draining;
            if restart {
                state.draining = true;
            }
            restart
        };

        if restart {
            tracing::debug!("Restarting drain for newly queued target");
            tokio::spawn(self.clone().drain());
        }
    }

    /// Returns a future that resolves once every queued target has finished
    ///
    /// Resolves immediately if the queue is already empty with nothing in
    /// flight. Calling `end` more than once is fine: every returned future
    /// waits on the same signal, which fires once per drain.
    pub fn end(&self) -> impl Future<Output = DrainReport> + Send + 'static {
        let mut done = self.inner.done.subscribe();
        {
            let mut state = self.inner.lock_state();
            state.completion_requested = true;
            self.inner.evaluate_completion(&mut state);
        }

        let inner = Arc::clone(&self.inner);
        async move {
            // The sender lives in `inner`, so the channel cannot close while we wait
            let _ = done.wait_for(|fired| *fired).await;
            let report = inner.lock_state().report.clone();
            report
        }
    }

    /// Operations dispatched but not yet finished
    pub fn in_flight(&self) -> usize {
        self.inner.lock_state().in_flight
    }

    /// Targets still waiting in the queue
    pub fn queued(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    /// Returns true once the completion signal has fired
    pub fn is_complete(&self) -> bool {
        self.inner.lock_state().completed
    }

    /// Snapshot of the counters and errors collected so far
    pub fn report(&self) -> DrainReport {
        self.inner.lock_state().report.clone()
    }

    async fn drain(self) {
        loop {
            let permit = match &self.inner.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };

            let target = {
                let mut state = self.inner.lock_state();
                if !state.queue.has_items() {
                    state.draining = false;
                    self.inner.evaluate_completion(&mut state);
                    break;
                }
                match state.queue.pop() {
                    Ok(target) => {
                        state.in_flight += 1;
                        state.report.dispatched += 1;
                        target
                    }
                    Err(e) => {
                        tracing::error!("Drain loop invariant broken: {}", e);
                        state.draining = false;
                        break;
                    }
                }
            };

            let guard = InFlightGuard::new(Arc::clone(&self.inner), target.to_string());
            self.dispatch(target, guard, permit);

            tokio::task::yield_now().await;
        }

        tracing::debug!("Drain loop idle");
    }

    /// Opens the operation for one popped target and hands it to its own task
    fn dispatch(&self, target: FetchTarget, mut guard: InFlightGuard, permit: Option<OwnedSemaphorePermit>) {
        let params = match inject_headers(&target, self.inner.headers.as_ref()) {
            Ok(params) => params,
            Err(source) => {
                let error = FetchError::Target {
                    target: target.to_string(),
                    source,
                };
                self.fail(&target, None, None, &mut guard, error);
                return;
            }
        };

        let handle = match self.inner.transport.open(params) {
            Ok(handle) => handle,
            Err(source) => {
                let error = FetchError::Open {
                    target: target.to_string(),
                    source,
                };
                self.fail(&target, None, None, &mut guard, error);
                return;
            }
        };

        if let Err(e) = guard.advance(PageState::Dispatched) {
            tracing::error!("Cannot dispatch {}: {}", target, e);
            return;
        }

        tracing::debug!(
            "Dispatched operation {} for {} ({} in flight)",
            handle.id(),
            target,
            self.in_flight()
        );

        call_hook("before_page", &target, || {
            self.inner.hooks.before_page(&BeforeContext {
                crawler: self,
                target: &target,
                operation: &handle,
            })
        });

        tokio::spawn(self.clone().process(target, handle, guard, permit));
    }

    /// Follows one operation's events to a terminal state
    async fn process(
        self,
        target: FetchTarget,
        mut handle: OperationHandle,
        mut guard: InFlightGuard,
        _permit: Option<OwnedSemaphorePermit>,
    ) {
        let mut response: Option<ResponseMeta> = None;
        let mut body = ResponseAccumulator::new();

        let outcome = loop {
            match handle.next_event().await {
                Some(TransportEvent::Response(meta)) => {
                    if let Err(e) = guard.advance(PageState::HeadersReceived) {
                        tracing::warn!("Ignoring extra response head for {}: {}", target, e);
                        continue;
                    }
                    tracing::debug!("{} responded with status {}", target, meta.status);

                    call_hook("page_response", &target, || {
                        self.inner.hooks.page_response(&ResponseContext {
                            crawler: &self,
                            target: &target,
                            operation: &handle,
                            response: &meta,
                        })
                    });
                    response = Some(meta);
                }
                Some(TransportEvent::Data(chunk)) => body.push(&chunk),
                Some(TransportEvent::End) => break Ok(()),
                Some(TransportEvent::Error(e)) => break Err(e),
                None => break Err(TransportError::Disconnected),
            }
        };

        match outcome {
            Ok(()) => match guard.advance(PageState::Complete) {
                Ok(()) => {
                    tracing::debug!(
                        "{} finished: {} bytes in {} chunks",
                        target,
                        body.len(),
                        body.chunk_count()
                    );
                    self.complete(&target, &handle, response.as_ref(), body.into_bytes());
                }
                Err(e) => tracing::error!("Cannot complete {}: {}", target, e),
            },
            Err(source) => {
                let error = FetchError::Transport {
                    target: target.to_string(),
                    source,
                };
                self.fail(&target, Some(&handle), response.as_ref(), &mut guard, error);
            }
        }

        // Hooks above may enqueue more work; release the slot only after them
        drop(guard);
    }

    fn complete(
        &self,
        target: &FetchTarget,
        handle: &OperationHandle,
        response: Option<&ResponseMeta>,
        body: Vec<u8>,
    ) {
        let document = Document::parse(&body);

        call_hook("page_complete", target, || {
            self.inner.hooks.page_complete(&CompleteContext {
                crawler: self,
                target,
                operation: handle,
                response,
                document: &document,
                body: &body,
            })
        });
    }

    /// Moves a page to `Failed` and reports the state it failed from
    fn fail(
        &self,
        target: &FetchTarget,
        handle: Option<&OperationHandle>,
        response: Option<&ResponseMeta>,
        guard: &mut InFlightGuard,
        error: FetchError,
    ) {
        let state = guard.page();
        if let Err(e) = guard.advance(PageState::Failed) {
            tracing::error!("Cannot fail {}: {}", target, e);
            return;
        }

        tracing::warn!("{} failed while {}: {}", target, state, error);
        self.inner.lock_state().report.errors.push(error.clone());

        call_hook("page_error", target, || {
            self.inner.hooks.page_error(&ErrorContext {
                crawler: self,
                target,
                operation: handle,
                response,
                state,
                error: &error,
            })
        });
    }
}
