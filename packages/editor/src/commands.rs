//! # Structural Command Engine
//!
//! Decides which kinds may be created at a cursor and performs schema-safe
//! insertions on the persistent editable tree.
//!
//! ## Planning
//!
//! ```text
//! doc ─ article ─ div ─ section ─ p      context: path to section, index 1
//!                          ▲
//!                          │ 1. direct parent at ctx.index
//!                   ▲      │ 2. each higher ancestor, just after the path child
//!                   └──────┘
//! ```
//!
//! At every level a direct insertion is tried first, then the shortest
//! chain of synthesized wrappers whose outermost node fits. The walk stops
//! after an isolating ancestor. The shallowest host with a plan wins.

use crate::config::EditorConfig;
use crate::tree::{child_kinds, EditableNode, EditableTree};
use petal_schema::{NodeKind, Schema, SchemaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Cannot insert {kind} inside {parent}")]
    IllegalInsertion { kind: NodeKind, parent: NodeKind },

    #[error("Invalid insertion context: {0}")]
    InvalidContext(String),

    #[error("{parent} cannot contain {child}")]
    IllegalNesting { parent: NodeKind, child: NodeKind },

    #[error("Cannot build a node tree from an empty kind list")]
    EmptyChain,

    #[error("Cannot join: {0}")]
    CannotJoin(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Cursor position: child-index path from the root to the parent node,
/// plus the sibling index inside that parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionContext {
    pub path: Vec<usize>,
    pub index: usize,
}

impl InsertionContext {
    pub fn new(path: Vec<usize>, index: usize) -> Self {
        Self { path, index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOptions {
    /// Fill required content of nodes built by `Create` commands.
    pub fill_on_create: bool,
    /// Longest chain of synthesized wrappers the planner considers.
    pub max_wrapper_depth: usize,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            fill_on_create: true,
            max_wrapper_depth: 3,
        }
    }
}

impl From<&EditorConfig> for CommandOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            fill_on_create: config.fill_on_create,
            max_wrapper_depth: config.max_wrapper_depth,
        }
    }
}

/// Where and how a node of some kind would be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPlan {
    pub host_path: Vec<usize>,
    pub host: NodeKind,
    pub index: usize,
    /// Wrapper kinds to synthesize, outermost first.
    pub wrappers: Vec<NodeKind>,
}

/// Stateless structural editing over a shared schema.
#[derive(Debug, Clone, Copy)]
pub struct CommandEngine {
    schema: &'static Schema,
    options: CommandOptions,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new(Schema::lwdita(), CommandOptions::default())
    }
}

impl CommandEngine {
    pub fn new(schema: &'static Schema, options: CommandOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn options(&self) -> CommandOptions {
        self.options
    }

    /// Whether a node of `kind` can be inserted at `ctx`.
    pub fn can_create(&self, tree: &EditableTree, kind: NodeKind, ctx: &InsertionContext) -> bool {
        matches!(self.plan(tree, kind, ctx), Ok(Some(_)))
    }

    /// Position of `kind` in `candidates`; `None` when absent.
    pub fn can_create_index(&self, kind: NodeKind, candidates: &[NodeKind]) -> Option<usize> {
        candidates.iter().position(|candidate| *candidate == kind)
    }

    /// Find the insertion plan for `kind` at `ctx`, if any.
    pub fn plan(
        &self,
        tree: &EditableTree,
        kind: NodeKind,
        ctx: &InsertionContext,
    ) -> CommandResult<Option<InsertionPlan>> {
        if !self.schema.lookup(kind).creatable {
            return Ok(None);
        }

        let kinds = tree
            .kinds_along(self.schema, &ctx.path)
            .ok_or_else(|| CommandError::InvalidContext(format!("no node at path {:?}", ctx.path)))??;

        for level in (0..=ctx.path.len()).rev() {
            let host_path = &ctx.path[..level];
            let host = kinds[level];
            let node = tree.node_at(host_path).ok_or_else(|| {
                CommandError::InvalidContext(format!("no node at path {:?}", host_path))
            })?;
            let children = child_kinds(self.schema, node, host)?;

            let index = if level == ctx.path.len() {
                if ctx.index > children.len() {
                    return Err(CommandError::InvalidContext(format!(
                        "index {} out of range for {} children",
                        ctx.index,
                        children.len()
                    )));
                }
                ctx.index
            } else {
                ctx.path[level] + 1
            };

            let model = self.schema.content_model(host);
            let wrappers = if model.allows_insert(&children, index, kind) {
                Some(Vec::new())
            } else {
                self.wrapper_chain(host, &children, index, kind)
            };

            if let Some(wrappers) = wrappers {
                debug!(
                    %kind,
                    %host,
                    depth = ctx.path.len() - level,
                    ?wrappers,
                    "Planned insertion"
                );
                return Ok(Some(InsertionPlan {
                    host_path: host_path.to_vec(),
                    host,
                    index,
                    wrappers,
                }));
            }

            if self.schema.lookup(host).isolating {
                break;
            }
        }

        Ok(None)
    }

    fn can_wrap(&self, wrapper: NodeKind) -> bool {
        !matches!(wrapper, NodeKind::Document | NodeKind::Text | NodeKind::Topic)
            && self.schema.lookup(wrapper).creatable
    }

    /// Shortest chain of wrappers, outermost first, that lets `kind` live at
    /// `index` among `children` of `host`.
    fn wrapper_chain(
        &self,
        host: NodeKind,
        children: &[NodeKind],
        index: usize,
        kind: NodeKind,
    ) -> Option<Vec<NodeKind>> {
        let host_model = self.schema.content_model(host);
        let mut frontier: Vec<Vec<NodeKind>> = vec![vec![kind]];

        for _ in 0..self.options.max_wrapper_depth {
            let mut next: Vec<Vec<NodeKind>> = Vec::new();
            for chain in &frontier {
                let inner = chain[0];
                for &wrapper in NodeKind::ALL {
                    if !self.can_wrap(wrapper) || chain.contains(&wrapper) {
                        continue;
                    }
                    if self.schema.content_model(wrapper).fill_around(inner).is_none() {
                        continue;
                    }
                    let mut extended = Vec::with_capacity(chain.len() + 1);
                    extended.push(wrapper);
                    extended.extend_from_slice(chain);
                    next.push(extended);
                }
            }

            let found = next
                .iter()
                .filter(|chain| host_model.allows_insert(children, index, chain[0]))
                .min();
            if let Some(chain) = found {
                // Drop the inserted kind itself from the end of the chain.
                return Some(chain[..chain.len() - 1].to_vec());
            }
            if next.is_empty() {
                return None;
            }
            frontier = next;
        }

        None
    }

    /// A single node of `kind` with its default attributes. With `fill`,
    /// required children are synthesized recursively so the node is valid
    /// on its own.
    pub fn create_node(&self, kind: NodeKind, fill: bool) -> EditableNode {
        if kind == NodeKind::Text {
            return EditableNode::text("");
        }

        let descriptor = self.schema.lookup(kind);
        let mut node = EditableNode::element(descriptor.presentation);
        for (name, value) in descriptor.default_attributes() {
            node.attrs.insert(name.to_string(), Some(value.to_string()));
        }
        node.attrs
            .insert("class".to_string(), Some(kind.as_str().to_string()));

        if fill {
            node.content = descriptor
                .content
                .required_fill()
                .into_iter()
                .map(|child| Arc::new(self.create_node(child, true)))
                .collect();
        }
        node
    }

    pub fn create_node_named(&self, name: &str, fill: bool) -> CommandResult<EditableNode> {
        let kind: NodeKind = name.parse()?;
        if kind.is_synthetic() {
            return Err(SchemaError::UnknownNodeKind(name.to_string()).into());
        }
        Ok(self.create_node(kind, fill))
    }

    /// Build nested nodes from `kinds`, innermost first: each kind becomes
    /// the child of the next one.
    pub fn create_nodes_tree(&self, kinds: &[NodeKind]) -> CommandResult<EditableNode> {
        let (&innermost, outer) = kinds.split_first().ok_or(CommandError::EmptyChain)?;
        let mut node = self.create_node(innermost, self.options.fill_on_create);
        let mut inner = innermost;
        for &wrapper in outer {
            node = self.wrap(node, inner, wrapper)?;
            inner = wrapper;
        }
        Ok(node)
    }

    /// Place `node` of kind `inner` inside a new `wrapper`, synthesizing the
    /// siblings the wrapper requires.
    fn wrap(&self, node: EditableNode, inner: NodeKind, wrapper: NodeKind) -> CommandResult<EditableNode> {
        let (fill, slot) = self
            .schema
            .content_model(wrapper)
            .fill_around(inner)
            .ok_or(CommandError::IllegalNesting {
                parent: wrapper,
                child: inner,
            })?;

        let mut outer = self.create_node(wrapper, false);
        let mut node = Some(node);
        for (i, kind) in fill.into_iter().enumerate() {
            let child = match node.take() {
                Some(inner_node) if i == slot => inner_node,
                other => {
                    node = other;
                    self.create_node(kind, true)
                }
            };
            outer.content.push(Arc::new(child));
        }
        Ok(outer)
    }

    /// Kinds `node` may stand for, best match first: the kind named by its
    /// class token, then the others sharing its tag in registry order.
    fn candidate_kinds(&self, node: &EditableNode) -> CommandResult<Vec<NodeKind>> {
        let mut candidates = self.schema.kinds_with_presentation(&node.tag);
        if candidates.is_empty() {
            return Err(SchemaError::unknown_presentation(node.tag.as_str(), None).into());
        }
        if let Some(token) = node.class_token() {
            if let Some(position) = candidates.iter().position(|kind| kind.as_str() == token) {
                let preferred = candidates.remove(position);
                candidates.insert(0, preferred);
            }
        }
        Ok(candidates)
    }

    /// Insert `node` at `ctx`, wrapping it as needed. Returns the new tree;
    /// `tree` itself is never modified.
    #[instrument(skip(self, tree, node), fields(tag = %node.tag, path = ?ctx.path, index = ctx.index))]
    pub fn insert_at(
        &self,
        tree: &EditableTree,
        ctx: &InsertionContext,
        node: EditableNode,
    ) -> CommandResult<EditableTree> {
        let candidates = self.candidate_kinds(&node)?;

        for &kind in &candidates {
            if let Some(plan) = self.plan(tree, kind, ctx)? {
                return self.apply_plan(tree, &plan, node, kind);
            }
        }

        let parent = match tree.kinds_along(self.schema, &ctx.path) {
            Some(Ok(kinds)) => kinds.last().copied().unwrap_or(NodeKind::Document),
            Some(Err(err)) => return Err(err.into()),
            None => {
                return Err(CommandError::InvalidContext(format!(
                    "no node at path {:?}",
                    ctx.path
                )))
            }
        };
        Err(CommandError::IllegalInsertion {
            kind: candidates[0],
            parent,
        })
    }

    /// Insert a freshly created node of `kind` at `ctx`.
    pub fn create_at(
        &self,
        tree: &EditableTree,
        ctx: &InsertionContext,
        kind: NodeKind,
    ) -> CommandResult<EditableTree> {
        let plan = self
            .plan(tree, kind, ctx)?
            .ok_or_else(|| self.illegal_here(tree, kind, ctx))?;
        let node = self.create_node(kind, self.options.fill_on_create);
        self.apply_plan(tree, &plan, node, kind)
    }

    fn illegal_here(&self, tree: &EditableTree, kind: NodeKind, ctx: &InsertionContext) -> CommandError {
        let parent = tree
            .kinds_along(self.schema, &ctx.path)
            .and_then(Result::ok)
            .and_then(|kinds| kinds.last().copied())
            .unwrap_or(NodeKind::Document);
        CommandError::IllegalInsertion { kind, parent }
    }

    fn apply_plan(
        &self,
        tree: &EditableTree,
        plan: &InsertionPlan,
        node: EditableNode,
        kind: NodeKind,
    ) -> CommandResult<EditableTree> {
        let mut inserted = node;
        let mut inner = kind;
        for &wrapper in plan.wrappers.iter().rev() {
            inserted = self.wrap(inserted, inner, wrapper)?;
            inner = wrapper;
        }

        let host = tree.node_at(&plan.host_path).ok_or_else(|| {
            CommandError::InvalidContext(format!("no node at path {:?}", plan.host_path))
        })?;
        let mut new_host = host.clone();
        new_host.content.insert(plan.index, Arc::new(inserted));

        tree.replace_node(&plan.host_path, new_host).ok_or_else(|| {
            CommandError::InvalidContext(format!("no node at path {:?}", plan.host_path))
        })
    }

    /// Merge the node at `path` into its previous sibling of the same tag.
    #[instrument(skip(self, tree))]
    pub fn join_backward(&self, tree: &EditableTree, path: &[usize]) -> CommandResult<EditableTree> {
        let (&index, parent_path) = path
            .split_last()
            .ok_or_else(|| CommandError::CannotJoin("the root has no siblings".to_string()))?;
        if index == 0 {
            return Err(CommandError::CannotJoin("no previous sibling".to_string()));
        }

        let kinds = tree
            .kinds_along(self.schema, parent_path)
            .ok_or_else(|| CommandError::InvalidContext(format!("no node at path {:?}", parent_path)))??;
        let parent_kind = kinds[kinds.len() - 1];
        let parent = tree.node_at(parent_path).ok_or_else(|| {
            CommandError::InvalidContext(format!("no node at path {:?}", parent_path))
        })?;
        let (previous, current) = match (parent.child(index - 1), parent.child(index)) {
            (Some(previous), Some(current)) => (previous, current),
            _ => {
                return Err(CommandError::InvalidContext(format!(
                    "no node at path {:?}",
                    path
                )))
            }
        };

        if previous.is_text() || current.is_text() || previous.tag != current.tag {
            return Err(CommandError::CannotJoin(format!(
                "<{}> cannot merge into <{}>",
                current.tag, previous.tag
            )));
        }

        let kind = self.schema.logical_name_of(&previous.tag, Some(parent_kind))?;
        let mut merged = previous.clone();
        merged.content = merge_text(previous.content.iter().chain(current.content.iter()));

        let merged_children = child_kinds(self.schema, &merged, kind)?;
        if let Err(mismatch) = self.schema.content_model(kind).matches(merged_children) {
            return Err(CommandError::CannotJoin(format!("merged {}: {}", kind, mismatch)));
        }

        let mut new_parent = parent.clone();
        new_parent.content[index - 1] = Arc::new(merged);
        new_parent.content.remove(index);
        let parent_children = child_kinds(self.schema, &new_parent, parent_kind)?;
        if let Err(mismatch) = self.schema.content_model(parent_kind).matches(parent_children) {
            return Err(CommandError::CannotJoin(format!("{}: {}", parent_kind, mismatch)));
        }

        debug!(%kind, %parent_kind, "Joined siblings");
        tree.replace_node(parent_path, new_parent).ok_or_else(|| {
            CommandError::InvalidContext(format!("no node at path {:?}", parent_path))
        })
    }
}

/// Concatenate adjacent text nodes and drop empty ones.
fn merge_text<'a>(children: impl Iterator<Item = &'a Arc<EditableNode>>) -> Vec<Arc<EditableNode>> {
    let mut merged: Vec<Arc<EditableNode>> = Vec::new();
    for child in children {
        if child.is_text() {
            let text = child.text.as_deref().unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            if let Some(previous) = merged.last_mut().filter(|previous| previous.is_text()) {
                let joined = format!("{}{}", previous.text.as_deref().unwrap_or_default(), text);
                *previous = Arc::new(EditableNode::text(joined));
                continue;
            }
        }
        merged.push(Arc::clone(child));
    }
    merged
}
