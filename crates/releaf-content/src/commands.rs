//! Command inventory of the content tree
//!
//! Every mutation the tree supports is a variant here; `apply()` is the
//! single entry point that executes one.

use crate::model::{NodeId, Target};
use crate::ops::{NewNode, NodeChanges};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a node (and its content object for record types)
    NodeCreate(NewNode),

    /// Edit node and content attributes
    NodeUpdate {
        node_id: NodeId,
        changes: NodeChanges,
    },

    /// Destroy a node with its subtree and content objects
    NodeDestroy { node_id: NodeId },

    /// Relocate a subtree
    NodeMove { node_id: NodeId, target: Target },

    /// Duplicate a subtree with fresh identities
    NodeCopy { node_id: NodeId, target: Target },
}

impl Command {
    /// Stable operation name used in logs
    pub fn op_name(&self) -> &'static str {
        match self {
            Command::NodeCreate(_) => "node_create",
            Command::NodeUpdate { .. } => "node_update",
            Command::NodeDestroy { .. } => "node_destroy",
            Command::NodeMove { .. } => "node_move",
            Command::NodeCopy { .. } => "node_copy",
        }
    }
}
