//! Releaf engine - orchestration of the content tree
//!
//! Runs node commands against the SQLite store inside one immediate
//! transaction each, and answers the read-only queries of menus and
//! edit forms.

pub mod commands;

pub use commands::engine_command::{apply_node_command, NodeCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult, NodeLocale};
