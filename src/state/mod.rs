//! Per-page lifecycle state
//!
//! `PageState` tracks where a single queued target is in its fetch lifecycle:
//! pending in the queue, dispatched to the transport, headers received, and
//! finally complete or failed.

mod page_state;

pub use page_state::PageState;
