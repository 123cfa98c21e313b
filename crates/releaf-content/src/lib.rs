//! Releaf content tree - the in-memory kernel of the node subsystem
//!
//! - Type Registry of the domain types that may act as tree content
//! - Nested-set [`Tree`] arena with range-based ancestor/descendant queries
//! - Node factory, attribute edits and cascading destroy
//! - Singleness rules and field-level validation
//! - Move/copy of whole subtrees under one transaction
//!
//! Persistence lives in `releaf-store`; `releaf-engine` wires the two
//! together inside SQLite transactions.

pub mod apply;
pub mod commands;
pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod node_schema;
pub mod ops;
pub mod queries;
pub mod registry;
pub mod rules;

#[doc(hidden)]
pub use releaf_core_types::schema;

pub use apply::{apply, CommandOutcome};
pub use commands::Command;
pub use config::ContentConfig;
pub use errors::{ContentError, ExError, ExErrorKind, FieldError, Result, ValidationErrors};
pub use model::{ContentId, ContentObject, NestedBounds, Node, NodeId, Target};
pub use node_schema::NodeSchema;
pub use ops::{DestroyOutcome, NewNode, NodeChanges, Tree};
pub use registry::{ContentKind, ContentTypeConfig, ContentTypeRegistration, TypeRegistry};
pub use rules::SinglenessRule;
