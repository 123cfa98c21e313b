//! Releaf store - SQLite persistence of the content tree
//!
//! - Connection helpers and checksummed embedded migrations
//! - Node, content object and settings repository
//! - Hydration of a `Tree` and diff-based persistence of its changes

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

pub use errors::Result;
