//! Utility functions and helpers for the offline agent.
//!
//! # Submodules
//!
//! - `logging`: Tracing subscriber initialization.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
