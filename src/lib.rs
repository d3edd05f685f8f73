//! Live-preview coordination engine.
//!
//! A [`preview::PreviewContext`] wires together the file store, dependency
//! tracker, code buffer, build queue, reload scheduler, error triage and
//! diagnostics layer over a typed [`bus::EventBus`]. The `cli` module is a
//! host binding over a directory of files.

#[macro_use]
pub mod logger;

pub mod buffer;
pub mod build;
pub mod bus;
pub mod cli;
pub mod config;
pub mod core;
pub mod deps;
pub mod monitor;
pub mod preview;
pub mod reload;
pub mod store;
pub mod triage;
pub mod utils;

pub use preview::{PreviewContext, PreviewParts, PreviewSurface};
