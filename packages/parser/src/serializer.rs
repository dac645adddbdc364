use crate::ast::{Attributes, Document, Node};
use petal_schema::{NodeKind, Schema};
use quick_xml::escape::{escape, partial_escape};
use std::fmt::Write;
use tracing::{debug, instrument};

/// Serializer converts a JDita document back to XDITA text.
///
/// Output is compact: no indentation is added, so mixed content survives
/// unchanged and `parse(serialize(doc))` is a fixed point. Elements without
/// children are written self-closing.
pub struct Serializer {
    schema: &'static Schema,
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_schema(Schema::lwdita())
    }

    pub fn with_schema(schema: &'static Schema) -> Self {
        Self { schema }
    }

    /// Serialize a document: prolog first, then the root topic.
    #[instrument(skip(self, doc), fields(default_prolog = doc.prolog.is_default()))]
    pub fn serialize(&mut self, doc: &Document) -> String {
        let mut output = doc.prolog.render();
        self.serialize_node(&doc.root, &mut output);

        debug!(bytes = output.len(), "Serialized document");
        output
    }

    /// Serialize a single subtree without any prolog.
    pub fn serialize_fragment(&mut self, node: &Node) -> String {
        let mut output = String::new();
        self.serialize_node(node, &mut output);
        output
    }

    fn serialize_node(&self, node: &Node, output: &mut String) {
        match node {
            Node::Text { content } => output.push_str(&partial_escape(content.as_str())),
            Node::Element {
                kind: NodeKind::Document,
                children,
                ..
            } => {
                for child in children {
                    self.serialize_node(child, output);
                }
            }
            Node::Element {
                kind,
                attributes,
                children,
            } => {
                let name = kind.as_str();
                write!(output, "<{}", name).unwrap();
                self.serialize_attributes(*kind, attributes, output);

                let has_content = children.iter().any(|child| match child {
                    Node::Text { content } => !content.is_empty(),
                    Node::Element { .. } => true,
                });
                if !has_content {
                    output.push_str("/>");
                    return;
                }

                output.push('>');
                for child in children {
                    self.serialize_node(child, output);
                }
                write!(output, "</{}>", name).unwrap();
            }
        }
    }

    /// Declared attributes in declaration order, then any others by name.
    fn serialize_attributes(&self, kind: NodeKind, attributes: &Attributes, output: &mut String) {
        let descriptor = self.schema.lookup(kind);
        let mut ordered: Vec<(&String, &str)> = attributes
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
            .collect();
        ordered.sort_by_key(|(name, _)| {
            (
                descriptor.attribute_rank(name).unwrap_or(usize::MAX),
                name.as_str(),
            )
        });

        for (name, value) in ordered {
            write!(output, " {}=\"{}\"", name, escape(value)).unwrap();
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a JDita document to XDITA text.
pub fn serialize(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}
