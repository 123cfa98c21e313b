//! Migration framework
//!
//! Embedded SQL migrations applied once each, in order, with a recorded
//! checksum that is verified on every later run.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
