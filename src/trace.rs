//! Logging macros that forward to the `tracing` crate when the `tracing`
//! feature is enabled and compile to no-ops otherwise.
//!
//! ```bash
//! # Normal build - no logging overhead
//! cargo build --release
//!
//! # Run tests with split/promotion logging
//! RUST_LOG=ordered_index=debug cargo test --features tracing
//! ```
#![allow(unused_macros, unused_imports)]

#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use {debug_log, trace_log};
