//! Types shared by the Releaf content crates
//!
//! - **Correlation**: RequestId, TraceId and the per-request RequestContext
//! - **Schema constants**: canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
