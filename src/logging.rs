// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Compile-time configurable logging.
//!
//! Thin wrapper over the [`log`] facade so callers pick their own subscriber
//! (`env_logger`, `tracing-log`, …) while chunk internals log through a
//! single, zero-cost-when-disabled surface.
//!
//! - **Zero-cost when disabled**: macros expand to nothing unless the
//!   `logging` Cargo feature is enabled.
//! - **No allocation on the hot path**: the `log` crate itself defers
//!   formatting to the active subscriber.
//!
//! ```ignore
//! use sorted_chunk::{debug, info};
//!
//! info!("chunk {} frozen", chunk_id);
//! debug!("sorted_count bumped to {}", new_count);
//! ```

/// Debug-level log message. No-op unless the `logging` feature is enabled.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__log::debug!($($arg)*); };
}

/// Info-level log message. No-op unless the `logging` feature is enabled.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log::info!($($arg)*); };
}

/// Warning-level log message. No-op unless the `logging` feature is enabled.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log::warn!($($arg)*); };
}

/// Error-level log message. No-op unless the `logging` feature is enabled.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log::error!($($arg)*); };
}

/// No-op debug macro (logging feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

/// No-op info macro (logging feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

/// No-op warn macro (logging feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

/// No-op error macro (logging feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}
