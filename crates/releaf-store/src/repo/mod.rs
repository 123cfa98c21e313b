//! Repository layer between the in-memory tree and SQLite

pub mod hydration;
pub mod persist;
pub mod sqlite_repo;

pub use persist::{persist_tree, persist_tree_changes, PersistStats};
pub use sqlite_repo::{SqliteRepo, NodeRow, NODES_UPDATED_AT};
