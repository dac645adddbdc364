use crate::prolog::Prolog;
use petal_schema::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of an element. `None` is an attribute that is declared
/// but carries no value.
pub type Attributes = BTreeMap<String, Option<String>>;

/// Node of the abstract ("JDita") tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Element of any registered kind, including the synthetic `document` root.
    Element {
        kind: NodeKind,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: Attributes,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node>,
    },

    /// Character data.
    Text { content: String },
}

impl Node {
    pub fn element(kind: NodeKind) -> Self {
        Node::Element {
            kind,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Node::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(name.into(), Some(value.into()));
        }
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        if let Node::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<Node>) -> Self {
        if let Node::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element { kind, .. } => *kind,
            Node::Text { .. } => NodeKind::Text,
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            Node::Element { attributes, .. } => Some(attributes),
            Node::Text { .. } => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .and_then(|attributes| attributes.get(name))
            .and_then(|value| value.as_deref())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            Node::Text { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element { children, .. } => Some(children),
            Node::Text { .. } => None,
        }
    }

    /// Concatenated character data of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { content } => out.push_str(content),
            Node::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// A parsed document: the abstract tree rooted at a `document` node plus
/// the prolog captured from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub prolog: Prolog,
    pub root: Node,
}

impl Document {
    /// Document with the default prolog.
    pub fn new(root: Node) -> Self {
        Self {
            prolog: Prolog::default(),
            root,
        }
    }

    pub fn with_prolog(root: Node, prolog: Prolog) -> Self {
        Self { prolog, root }
    }

    /// JSON form of the JDita tree and its prolog.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The root topic element.
    pub fn topic(&self) -> Option<&Node> {
        self.root
            .children()
            .iter()
            .find(|node| node.kind() == NodeKind::Topic)
    }
}
