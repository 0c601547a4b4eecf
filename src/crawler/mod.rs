//! Crawler module: the queue-draining fetch engine
//!
//! This module contains the core crawling logic, including:
//! - The FIFO target queue
//! - The drain loop, in-flight counter and completion signal
//! - Per-page body accumulation and document parsing
//! - Lifecycle hooks and per-page error reporting

mod accumulator;
mod engine;
mod hooks;
mod parser;
mod queue;
mod report;

pub use accumulator::ResponseAccumulator;
pub use engine::{CrawlOptions, Crawler};
pub use hooks::{
    BeforeContext, CallbackHooks, CompleteContext, ErrorContext, NoopHooks, PageHooks,
    ResponseContext,
};
pub use parser::Document;
pub use queue::TargetQueue;
pub use report::{DrainReport, FetchError};

