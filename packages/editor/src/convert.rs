//! # Tree Converter
//!
//! Maps between the JDita tree and the editable tree.
//!
//! ```text
//! JDita Node { kind, attributes }          EditableNode { tag, attrs }
//!   kind                        ───────▶     presentation tag
//!   class="- topic/p "          ───────▶     data-class="- topic/p ", class="topic-p"
//!   outputclass="lead"          ───────▶     class="topic-p lead"
//! ```
//!
//! `to_abstract(to_editable(t)) == t` for every schema-valid `t`.

use crate::tree::{kind_of, Attrs, EditableNode, ROOT_TAG};
use petal_parser::{Attributes, Node};
use petal_schema::{NodeKind, Schema};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Attribute carrying the DITA `class` on the editable side.
pub const DATA_CLASS: &str = "data-class";

/// Prefix of attributes owned by the editing surface.
pub const SURFACE_ATTR_PREFIX: &str = "data-pm-";

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Unrecognized presentation node <{tag}>{}", inside(.parent))]
    UnrecognizedPresentationNode {
        tag: String,
        parent: Option<NodeKind>,
    },

    #[error("Text node without text inside <{parent}>")]
    MissingText { parent: NodeKind },
}

fn inside(parent: &Option<NodeKind>) -> String {
    match parent {
        Some(kind) => format!(" inside <{}>", kind),
        None => String::new(),
    }
}

/// CSS token for a kind: the last token of its DITA class with `/` turned
/// into `-`, or the kind name.
pub fn css_token(kind: NodeKind, dita_class: Option<&str>) -> String {
    dita_class
        .and_then(|class| class.split_whitespace().last())
        .map(|token| token.replace('/', "-"))
        .unwrap_or_else(|| kind.as_str().to_string())
}

/// Presentation `class` value: the CSS token, then the outputclass if any.
pub fn presentation_class(kind: NodeKind, dita_class: Option<&str>, outputclass: Option<&str>) -> String {
    let token = css_token(kind, dita_class);
    match outputclass {
        Some(outputclass) => format!("{} {}", token, outputclass),
        None => token,
    }
}

/// Convert a JDita subtree to its editable form. Total.
#[instrument(skip(schema, node), fields(kind = %node.kind()))]
pub fn to_editable(schema: &Schema, node: &Node) -> EditableNode {
    let editable = editable_node(schema, node);
    debug!(tag = %editable.tag, "Converted to editable tree");
    editable
}

fn editable_node(schema: &Schema, node: &Node) -> EditableNode {
    match node {
        Node::Text { content } => EditableNode::text(content.as_str()),
        Node::Element {
            kind,
            attributes,
            children,
        } => EditableNode {
            tag: schema.presentation_name_of(*kind).to_string(),
            attrs: editable_attrs(*kind, attributes),
            content: children
                .iter()
                .map(|child| Arc::new(editable_node(schema, child)))
                .collect(),
            text: None,
        },
    }
}

fn editable_attrs(kind: NodeKind, attributes: &Attributes) -> Attrs {
    let dita_class = attributes.get("class").and_then(|value| value.as_deref());
    let outputclass = attributes.get("outputclass").and_then(|value| value.as_deref());

    // A null outputclass has no place in the presentation class and is
    // carried through as is.
    let mut attrs: Attrs = attributes
        .iter()
        .filter(|(name, value)| match name.as_str() {
            "class" => false,
            "outputclass" => value.is_none(),
            _ => true,
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    if let Some(class) = attributes.get("class") {
        attrs.insert(DATA_CLASS.to_string(), class.clone());
    }
    attrs.insert(
        "class".to_string(),
        Some(presentation_class(kind, dita_class, outputclass)),
    );
    attrs
}

/// Convert an editable tree back to JDita. The root must be tagged `doc`.
///
/// Fails on the first node that cannot be mapped; no partial tree is
/// returned.
#[instrument(skip(schema, root), fields(tag = %root.tag))]
pub fn to_abstract(schema: &Schema, root: &EditableNode) -> ConvertResult<Node> {
    if root.tag != ROOT_TAG {
        return Err(ConvertError::UnrecognizedPresentationNode {
            tag: root.tag.clone(),
            parent: None,
        });
    }
    abstract_node(schema, root, NodeKind::Document)
}

/// Convert an editable subtree whose kind is already known.
pub fn to_abstract_as(schema: &Schema, node: &EditableNode, kind: NodeKind) -> ConvertResult<Node> {
    abstract_node(schema, node, kind)
}

fn abstract_node(schema: &Schema, node: &EditableNode, kind: NodeKind) -> ConvertResult<Node> {
    if node.text.is_some() {
        return Err(ConvertError::UnrecognizedPresentationNode {
            tag: node.tag.clone(),
            parent: None,
        });
    }

    let mut children = Vec::with_capacity(node.content.len());
    for child in &node.content {
        let child_kind = kind_of(schema, child, Some(kind)).map_err(|_| {
            ConvertError::UnrecognizedPresentationNode {
                tag: child.tag.clone(),
                parent: Some(kind),
            }
        })?;

        let malformed = if child_kind == NodeKind::Text {
            !child.content.is_empty()
        } else {
            child.text.is_some()
        };
        if malformed {
            return Err(ConvertError::UnrecognizedPresentationNode {
                tag: child.tag.clone(),
                parent: Some(kind),
            });
        }

        if child_kind == NodeKind::Text {
            let text = child
                .text
                .as_ref()
                .ok_or(ConvertError::MissingText { parent: kind })?;
            children.push(Node::text(text.as_str()));
        } else {
            children.push(abstract_node(schema, child, child_kind)?);
        }
    }

    Ok(Node::Element {
        kind,
        attributes: abstract_attributes(kind, &node.attrs),
        children,
    })
}

fn abstract_attributes(kind: NodeKind, attrs: &Attrs) -> Attributes {
    let mut attributes = Attributes::new();
    for (name, value) in attrs {
        match name.as_str() {
            "class" => {
                let remainder = value
                    .as_deref()
                    .and_then(|class| class.split_once(' '))
                    .map(|(_, outputclass)| outputclass.to_string());
                if let Some(outputclass) = remainder {
                    attributes.insert("outputclass".to_string(), Some(outputclass));
                }
            }
            DATA_CLASS => {
                attributes.insert("class".to_string(), value.clone());
            }
            surface if surface.starts_with(SURFACE_ATTR_PREFIX) => {
                warn!(%kind, attribute = surface, "Dropping surface-only attribute");
            }
            // `class` sorts first, so a remainder always wins over a null.
            "outputclass" => {
                attributes
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            _ => {
                attributes.insert(name.clone(), value.clone());
            }
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use petal_parser::parse;

    fn schema() -> &'static Schema {
        Schema::lwdita()
    }

    #[test]
    fn test_css_token() {
        assert_eq!(css_token(NodeKind::P, Some("- topic/p ")), "topic-p");
        assert_eq!(css_token(NodeKind::P, Some("- topic/ph hi-d/b ")), "hi-d-b");
        assert_eq!(css_token(NodeKind::P, None), "p");
        assert_eq!(css_token(NodeKind::VideoPoster, None), "video-poster");
    }

    #[test]
    fn test_class_mapping() {
        let node = Node::element(NodeKind::P)
            .with_attr("class", "- topic/p ")
            .with_attr("outputclass", "lead wide")
            .with_attr("id", "p1");
        let editable = to_editable(schema(), &node);
        assert_eq!(editable.tag, "p");
        assert_eq!(editable.attr("class"), Some("topic-p lead wide"));
        assert_eq!(editable.attr(DATA_CLASS), Some("- topic/p "));
        assert_eq!(editable.attr("id"), Some("p1"));
        assert_eq!(editable.attr("outputclass"), None);

        let back = to_abstract_as(schema(), &editable, NodeKind::P).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_null_attributes_survive_conversion() {
        let node = Node::Element {
            kind: NodeKind::P,
            attributes: [
                ("outputclass".to_string(), None),
                ("props".to_string(), None),
            ]
            .into_iter()
            .collect(),
            children: vec![Node::text("x")],
        };
        let editable = to_editable(schema(), &node);
        assert_eq!(editable.attr("class"), Some("p"));
        assert_eq!(editable.attrs.get("outputclass"), Some(&None));
        assert_eq!(to_abstract_as(schema(), &editable, NodeKind::P).unwrap(), node);
    }

    #[test]
    fn test_outputclass_from_class_wins_over_null() {
        let mut editable = EditableNode::element("p").with_attr("class", "p lead");
        editable.attrs.insert("outputclass".to_string(), None);
        let node = to_abstract_as(schema(), &editable, NodeKind::P).unwrap();
        assert_eq!(node.attribute("outputclass"), Some("lead"));
    }

    #[test]
    fn test_text_on_element_is_rejected() {
        let mut p = EditableNode::element("p").with_attr("class", "p");
        p.text = Some("stray".to_string());
        let editable = EditableNode::element("section").with_child(p);
        assert_eq!(
            to_abstract_as(schema(), &editable, NodeKind::Section).unwrap_err(),
            ConvertError::UnrecognizedPresentationNode {
                tag: "p".to_string(),
                parent: Some(NodeKind::Section)
            }
        );

        let mut root = EditableNode::element(ROOT_TAG);
        root.text = Some("stray".to_string());
        assert!(to_abstract(schema(), &root).is_err());
    }

    #[test]
    fn test_content_on_text_is_rejected() {
        let text = EditableNode::text("a").with_child(EditableNode::text("b"));
        let editable = EditableNode::element("p").with_child(text);
        assert_eq!(
            to_abstract_as(schema(), &editable, NodeKind::P).unwrap_err(),
            ConvertError::UnrecognizedPresentationNode {
                tag: "text".to_string(),
                parent: Some(NodeKind::P)
            }
        );
    }

    #[test]
    fn test_surface_attributes_are_dropped() {
        let editable = EditableNode::element("p")
            .with_attr("class", "p")
            .with_attr("data-pm-slice", "1 1")
            .with_child(EditableNode::text("x"));
        let node = to_abstract_as(schema(), &editable, NodeKind::P).unwrap();
        assert_eq!(node, Node::element(NodeKind::P).with_child(Node::text("x")));
    }

    #[test]
    fn test_conversion_is_inverse() {
        let doc = parse(
            r#"<topic id="t" outputclass="x"><title>T</title><shortdesc>S</shortdesc><body><dl><dlentry><dt>a</dt><dd><p>b</p></dd></dlentry></dl><section><title>S</title><p>P <ph>ph</ph></p><fig><title>F</title><image href="a.png"><alt>A</alt></image></fig></section><fn callout="*"><p>f</p></fn></body></topic>"#,
        )
        .unwrap();
        let editable = to_editable(schema(), &doc.root);
        assert_eq!(editable.tag, "doc");
        assert_eq!(to_abstract(schema(), &editable).unwrap(), doc.root);
    }

    #[test]
    fn test_root_must_be_doc() {
        let err = to_abstract(schema(), &EditableNode::element("article")).unwrap_err();
        assert_eq!(
            err,
            ConvertError::UnrecognizedPresentationNode {
                tag: "article".to_string(),
                parent: None
            }
        );
    }

    #[test]
    fn test_unknown_tag_aborts_conversion() {
        let editable = EditableNode::element(ROOT_TAG).with_child(
            EditableNode::element("article")
                .with_child(EditableNode::element("h1"))
                .with_child(EditableNode::element("div").with_child(EditableNode::element("blink"))),
        );
        assert_eq!(
            to_abstract(schema(), &editable).unwrap_err(),
            ConvertError::UnrecognizedPresentationNode {
                tag: "blink".to_string(),
                parent: Some(NodeKind::Body)
            }
        );
    }

    #[test]
    fn test_text_without_text() {
        let mut text = EditableNode::text("");
        text.text = None;
        let editable = EditableNode::element("p").with_child(text);
        assert_eq!(
            to_abstract_as(schema(), &editable, NodeKind::P).unwrap_err(),
            ConvertError::MissingText { parent: NodeKind::P }
        );
    }
}
