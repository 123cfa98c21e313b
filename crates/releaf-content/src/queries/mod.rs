//! Read-only queries over a [`crate::ops::Tree`]
//!
//! No query mutates the tree; results follow nested-set order.

pub mod node_queries;

pub use node_queries::{
    content_class, content_fields_to_display, is_available, locale, node_content,
    nodes_updated_at, valid_node_content_classes,
};
