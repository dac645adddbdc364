//! # Editable Tree
//!
//! The presentation-side tree handed to the editing surface. Nodes are named
//! by presentation tag (`article`, `h1`, `p`, ...) and serialize to the
//! rich-text JSON shape `{ "type", "attrs", "content", "text" }`.
//!
//! The tree is persistent: children are shared `Arc`s and every edit copies
//! only the spine from the root to the edited node, so an older
//! [`EditableTree`] value is never affected by a newer one.

use petal_schema::{NodeKind, Schema, SchemaResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Presentation tag of text nodes.
pub const TEXT_TAG: &str = "text";

/// Presentation tag of the tree root.
pub const ROOT_TAG: &str = "doc";

pub type Attrs = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableNode {
    #[serde(rename = "type")]
    pub tag: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: Attrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Arc<EditableNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl EditableNode {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            tag: TEXT_TAG.to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_child(mut self, child: EditableNode) -> Self {
        self.content.push(Arc::new(child));
        self
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(|value| value.as_deref())
    }

    pub fn child(&self, index: usize) -> Option<&EditableNode> {
        self.content.get(index).map(|child| child.as_ref())
    }

    /// First token of the presentation `class`, which names the node kind.
    pub fn class_token(&self) -> Option<&str> {
        self.attr("class")
            .and_then(|class| class.split_whitespace().next())
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.content {
            child.collect_text(out);
        }
    }
}

/// Resolve the kind of `node` given the kind of its parent.
///
/// The root has no parent and must be tagged [`ROOT_TAG`].
pub fn kind_of(schema: &Schema, node: &EditableNode, parent: Option<NodeKind>) -> SchemaResult<NodeKind> {
    schema.logical_name_of(&node.tag, parent)
}

/// Kinds of the direct children of `node`, which is of kind `kind`.
pub fn child_kinds(schema: &Schema, node: &EditableNode, kind: NodeKind) -> SchemaResult<Vec<NodeKind>> {
    node.content
        .iter()
        .map(|child| kind_of(schema, child, Some(kind)))
        .collect()
}

/// Immutable handle on the root of an editable tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditableTree {
    root: Arc<EditableNode>,
}

impl EditableTree {
    pub fn new(root: EditableNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &EditableNode {
        &self.root
    }

    /// Node reached by following child indices from the root.
    pub fn node_at(&self, path: &[usize]) -> Option<&EditableNode> {
        let mut node: &EditableNode = &self.root;
        for &index in path {
            node = node.child(index)?;
        }
        Some(node)
    }

    /// Kinds of the root and of every node along `path`, root first.
    pub fn kinds_along(&self, schema: &Schema, path: &[usize]) -> Option<SchemaResult<Vec<NodeKind>>> {
        let mut node: &EditableNode = &self.root;
        let mut kinds = Vec::with_capacity(path.len() + 1);
        match kind_of(schema, node, None) {
            Ok(kind) => kinds.push(kind),
            Err(err) => return Some(Err(err)),
        }
        for &index in path {
            node = node.child(index)?;
            let parent = kinds.last().copied();
            match kind_of(schema, node, parent) {
                Ok(kind) => kinds.push(kind),
                Err(err) => return Some(Err(err)),
            }
        }
        Some(Ok(kinds))
    }

    /// New tree with the node at `path` replaced. Untouched subtrees are
    /// shared with `self`. `None` when the path does not exist.
    pub fn replace_node(&self, path: &[usize], node: EditableNode) -> Option<Self> {
        let root = replace_in(&self.root, path, Arc::new(node))?;
        Some(Self { root })
    }

    /// Whether both trees share the node at `path` by pointer.
    pub fn shares_node(&self, other: &EditableTree, path: &[usize]) -> bool {
        match (self.arc_at(path), other.arc_at(path)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn arc_at(&self, path: &[usize]) -> Option<&Arc<EditableNode>> {
        let mut node = &self.root;
        for &index in path {
            node = node.content.get(index)?;
        }
        Some(node)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn replace_in(
    node: &Arc<EditableNode>,
    path: &[usize],
    replacement: Arc<EditableNode>,
) -> Option<Arc<EditableNode>> {
    match path.split_first() {
        None => Some(replacement),
        Some((&index, rest)) => {
            let child = node.content.get(index)?;
            let new_child = replace_in(child, rest, replacement)?;
            let mut copy = EditableNode::clone(node);
            copy.content[index] = new_child;
            Some(Arc::new(copy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EditableTree {
        EditableTree::new(
            EditableNode::element(ROOT_TAG).with_child(
                EditableNode::element("article")
                    .with_child(EditableNode::element("h1").with_child(EditableNode::text("Title")))
                    .with_child(
                        EditableNode::element("div")
                            .with_child(EditableNode::element("p").with_child(EditableNode::text("One")))
                            .with_child(EditableNode::element("p").with_child(EditableNode::text("Two"))),
                    ),
            ),
        )
    }

    #[test]
    fn test_node_at() {
        let tree = sample();
        assert_eq!(tree.node_at(&[]).unwrap().tag, ROOT_TAG);
        assert_eq!(tree.node_at(&[0, 1, 1]).unwrap().text_content(), "Two");
        assert!(tree.node_at(&[0, 5]).is_none());
    }

    #[test]
    fn test_kinds_along_uses_parent_hint() {
        let tree = sample();
        let kinds = tree.kinds_along(Schema::lwdita(), &[0, 1, 0]).unwrap().unwrap();
        assert_eq!(
            kinds,
            vec![NodeKind::Document, NodeKind::Topic, NodeKind::Body, NodeKind::P]
        );
        assert!(tree.kinds_along(Schema::lwdita(), &[3]).is_none());
    }

    #[test]
    fn test_replace_node_copies_only_the_spine() {
        let tree = sample();
        let edited = tree
            .replace_node(&[0, 1, 1], EditableNode::element("p").with_child(EditableNode::text("Changed")))
            .unwrap();

        assert_eq!(tree.node_at(&[0, 1, 1]).unwrap().text_content(), "Two");
        assert_eq!(edited.node_at(&[0, 1, 1]).unwrap().text_content(), "Changed");
        assert!(edited.shares_node(&tree, &[0, 0]));
        assert!(edited.shares_node(&tree, &[0, 1, 0]));
        assert!(!edited.shares_node(&tree, &[0, 1]));
        assert!(tree.replace_node(&[9], EditableNode::text("x")).is_none());
    }

    #[test]
    fn test_json_shape() {
        let node = EditableNode::element("p")
            .with_attr("class", "p")
            .with_child(EditableNode::text("Hi"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "p",
                "attrs": { "class": "p" },
                "content": [{ "type": "text", "text": "Hi" }]
            })
        );

        let tree = EditableTree::new(node);
        let back = EditableTree::from_json(&tree.to_json().unwrap()).unwrap();
        assert_eq!(back, tree);
    }
}
