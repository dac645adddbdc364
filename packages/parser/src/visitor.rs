use crate::ast::{Document, Node};
use crate::error::{ParseError, ParseResult};
use petal_schema::{NodeKind, Schema};
use std::collections::BTreeMap;

/// Visitor pattern for traversing JDita trees immutably
///
/// Default implementations walk the entire tree. Override specific visit_*
/// methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_element(&mut self, element: &Node) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _content: &str) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for rewriting JDita trees
pub trait VisitorMut: Sized {
    fn visit_document_mut(&mut self, doc: &mut Document) {
        walk_document_mut(self, doc);
    }

    fn visit_element_mut(&mut self, element: &mut Node) {
        walk_element_mut(self, element);
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    visitor.visit_element(&doc.root);
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Node) {
    for child in element.children() {
        match child {
            Node::Text { content } => visitor.visit_text(content),
            Node::Element { .. } => visitor.visit_element(child),
        }
    }
}

pub fn walk_document_mut<V: VisitorMut>(visitor: &mut V, doc: &mut Document) {
    visitor.visit_element_mut(&mut doc.root);
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Node) {
    if let Some(children) = element.children_mut() {
        for child in children.iter_mut() {
            if let Node::Element { .. } = child {
                visitor.visit_element_mut(child);
            }
        }
    }
}

/// Checks every element of a tree against its content model.
///
/// Stops at the first violation, in document order.
pub struct SchemaValidator {
    schema: &'static Schema,
    error: Option<ParseError>,
}

impl SchemaValidator {
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            error: None,
        }
    }

    pub fn finish(self) -> ParseResult<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Visitor for SchemaValidator {
    fn visit_element(&mut self, element: &Node) {
        if self.error.is_some() {
            return;
        }
        let kind = element.kind();
        let result = self
            .schema
            .content_model(kind)
            .matches(element.children().iter().map(Node::kind));
        if let Err(mismatch) = result {
            self.error = Some(ParseError::from_mismatch(kind, mismatch));
            return;
        }
        walk_element(self, element);
    }
}

/// Validate a whole document against the LwDITA schema.
pub fn validate(doc: &Document) -> ParseResult<()> {
    let mut validator = SchemaValidator::new(Schema::lwdita());
    validator.visit_document(doc);
    validator.finish()
}

/// Merges adjacent text nodes and drops empty ones.
#[derive(Default)]
pub struct TextNormalizer {
    pub merged: usize,
    pub dropped: usize,
}

impl VisitorMut for TextNormalizer {
    fn visit_element_mut(&mut self, element: &mut Node) {
        if let Some(children) = element.children_mut() {
            let mut normalized: Vec<Node> = Vec::with_capacity(children.len());
            for child in children.drain(..) {
                match child {
                    Node::Text { content } if content.is_empty() => self.dropped += 1,
                    Node::Text { content } => {
                        if let Some(Node::Text { content: previous }) = normalized.last_mut() {
                            previous.push_str(&content);
                            self.merged += 1;
                        } else {
                            normalized.push(Node::Text { content });
                        }
                    }
                    child => normalized.push(child),
                }
            }
            *children = normalized;
        }
        walk_element_mut(self, element);
    }
}

/// Normalize text in place; returns how many text nodes were removed.
pub fn normalize_text(doc: &mut Document) -> usize {
    let mut normalizer = TextNormalizer::default();
    normalizer.visit_document_mut(doc);
    normalizer.merged + normalizer.dropped
}

/// Element counts per kind and total text length of a document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocumentStats {
    counts: BTreeMap<NodeKind, usize>,
    pub text_len: usize,
}

impl DocumentStats {
    pub fn count(&self, kind: NodeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn elements(&self) -> usize {
        self.counts
            .iter()
            .filter(|(kind, _)| !kind.is_synthetic())
            .map(|(_, count)| count)
            .sum()
    }
}

impl Visitor for DocumentStats {
    fn visit_element(&mut self, element: &Node) {
        *self.counts.entry(element.kind()).or_default() += 1;
        walk_element(self, element);
    }

    fn visit_text(&mut self, content: &str) {
        *self.counts.entry(NodeKind::Text).or_default() += 1;
        self.text_len += content.chars().count();
    }
}

pub fn stats(doc: &Document) -> DocumentStats {
    let mut stats = DocumentStats::default();
    stats.visit_document(doc);
    stats
}

/// Concatenated text of the whole document in document order.
#[derive(Debug, Default)]
struct TextCollector {
    text: String,
}

impl Visitor for TextCollector {
    fn visit_text(&mut self, content: &str) {
        self.text.push_str(content);
    }
}

pub fn collect_text(doc: &Document) -> String {
    let mut collector = TextCollector::default();
    collector.visit_document(doc);
    collector.text
}
