//! Shared utilities for snipfmt.
//!
//! This crate provides common utilities used across the snipfmt workspace:
//! - Short random identifier generation for shared snippets
//! - Wall-clock abstraction so expiry can be tested deterministically
//! - Logging setup with tracing

pub mod clock;
pub mod id;
pub mod log;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::Identifier;
