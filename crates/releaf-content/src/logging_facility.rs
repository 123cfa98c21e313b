//! Structured logging for tree operations
//!
//! - `init(profile)` installs the subscriber once per process
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the canonical
//!   start/end events with `component`, `op`, `event` and `duration_ms`
//! - `test_capture` records events in memory so tests can assert on them
//!
//! ```rust
//! use releaf_content::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
