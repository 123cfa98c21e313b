pub mod node_ops;
pub mod structure_ops;
pub mod tree;

pub use node_ops::{
    create_node, destroy_node, maintain_name, update_node, DestroyOutcome, NewNode, NodeChanges,
};
pub use structure_ops::{copy_to, move_to};
pub use tree::Tree;
