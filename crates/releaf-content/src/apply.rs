//! Functional-boundary apply function
//!
//! `apply()` takes ownership of the current tree, executes one command and
//! returns the new tree. It is all-or-nothing: on error no partial change
//! is visible, and the tree's structural invariants hold on success.
//!
//! ```
//! use releaf_content::{apply, Command, NewNode, NodeSchema, Tree};
//! use releaf_content::registry::{ContentTypeConfig, TypeRegistry};
//!
//! let registry = TypeRegistry::builder()
//!     .register("Text", ContentTypeConfig::record(["id", "text_html"]))
//!     .unwrap()
//!     .build();
//! let tree = Tree::new(NodeSchema::new(registry).shared());
//!
//! let (tree, outcome) = apply(tree, Command::NodeCreate(NewNode::new("Home", "Text"))).unwrap();
//! assert_eq!(tree.len(), 1);
//! assert!(outcome.node_id().is_some());
//! ```

use crate::commands::Command;
use crate::errors::Result;
use crate::model::NodeId;
use crate::ops::{self, DestroyOutcome, Tree};

/// What a successfully applied command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(NodeId),
    Updated(NodeId),
    Destroyed(DestroyOutcome),
    Moved(NodeId),
    /// Id of the copied subtree's root
    Copied(NodeId),
}

impl CommandOutcome {
    /// Node the command produced or touched; `None` after a destroy
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            CommandOutcome::Created(id)
            | CommandOutcome::Updated(id)
            | CommandOutcome::Moved(id)
            | CommandOutcome::Copied(id) => Some(*id),
            CommandOutcome::Destroyed(_) => None,
        }
    }
}

/// Apply a command to a tree, returning the new tree
///
/// # Errors
///
/// Any error of the underlying operation; the caller's previous state
/// is unaffected because the operations are transactional.
pub fn apply(mut state: Tree, cmd: Command) -> Result<(Tree, CommandOutcome)> {
    let outcome = match cmd {
        Command::NodeCreate(new) => CommandOutcome::Created(ops::create_node(&mut state, new)?),

        Command::NodeUpdate { node_id, changes } => {
            ops::update_node(&mut state, node_id, changes)?;
            CommandOutcome::Updated(node_id)
        }

        Command::NodeDestroy { node_id } => {
            CommandOutcome::Destroyed(ops::destroy_node(&mut state, node_id)?)
        }

        Command::NodeMove { node_id, target } => {
            ops::move_to(&mut state, node_id, target)?;
            CommandOutcome::Moved(node_id)
        }

        Command::NodeCopy { node_id, target } => {
            CommandOutcome::Copied(ops::copy_to(&mut state, node_id, target)?)
        }
    };
    Ok((state, outcome))
}
