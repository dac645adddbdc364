//! # Structural Commands
//!
//! The messages the editing surface sends when it needs schema knowledge.
//! Text edits, deletions and selection stay with the surface; it hands the
//! resulting tree back through `Document::set_tree`.

use crate::commands::{CommandEngine, CommandResult, InsertionContext};
use crate::tree::{EditableNode, EditableTree};
use petal_schema::NodeKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Insert a node built by the surface
    Insert {
        context: InsertionContext,
        node: EditableNode,
    },

    /// Create a node of `kind` and insert it
    Create {
        kind: NodeKind,
        context: InsertionContext,
    },

    /// Merge the node at `path` into its previous sibling
    JoinBackward { path: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub version: u64,
}

impl Command {
    /// Run the command; the input tree is left as it was.
    pub fn run(&self, engine: &CommandEngine, tree: &EditableTree) -> CommandResult<EditableTree> {
        match self {
            Command::Insert { context, node } => engine.insert_at(tree, context, node.clone()),
            Command::Create { kind, context } => engine.create_at(tree, context, *kind),
            Command::JoinBackward { path } => engine.join_backward(tree, path),
        }
    }
}
