pub mod content;
pub mod node;
pub mod target;

pub use content::{ContentId, ContentObject};
pub use node::{slugify, NestedBounds, Node, NodeId, MAX_NAME_LEN, MAX_SLUG_LEN};
pub use target::Target;
