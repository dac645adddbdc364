use crate::ast::{Attributes, Document, Node};
use crate::error::{ParseError, ParseResult};
use crate::prolog::Prolog;
use petal_schema::{NodeKind, Schema, SchemaError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument};

/// Element whose end tag has not been seen yet.
struct OpenElement {
    kind: NodeKind,
    attributes: Attributes,
    children: Vec<Node>,
    admits_text: bool,
}

impl OpenElement {
    fn push_text(&mut self, content: &str) {
        if let Some(Node::Text { content: previous }) = self.children.last_mut() {
            previous.push_str(content);
        } else {
            self.children.push(Node::text(content));
        }
    }
}

/// Streaming XML to JDita parser.
///
/// Elements are mapped to kinds through the [`Schema`] and every child
/// sequence is validated against its parent's content model when the parent
/// closes.
pub struct Parser<'src> {
    source: &'src str,
    schema: &'static Schema,
    reader: Reader<&'src [u8]>,
    stack: Vec<OpenElement>,
    root: Option<Node>,
    prolog: Prolog,
    seen_markup: bool,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_schema(source, Schema::lwdita())
    }

    pub fn with_schema(source: &'src str, schema: &'static Schema) -> Self {
        Self {
            source,
            schema,
            reader: Reader::from_str(source),
            stack: Vec::new(),
            root: None,
            prolog: Prolog::default(),
            seen_markup: false,
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Parse the whole source into a document.
    #[instrument(skip(self), fields(len = self.source.len()))]
    pub fn parse_document(mut self) -> ParseResult<Document> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|err| ParseError::malformed(self.reader.buffer_position() as usize, err.to_string()))?;

            match event {
                Event::Decl(_) => self.capture_declaration()?,
                Event::DocType(_) => self.capture_doctype()?,
                Event::Start(start) => {
                    let element = self.open_element(&start)?;
                    self.stack.push(element);
                }
                Event::Empty(start) => {
                    let element = self.open_element(&start)?;
                    self.close_element(element)?;
                }
                Event::End(_) => {
                    let element = self
                        .stack
                        .pop()
                        .ok_or_else(|| ParseError::malformed(self.position(), "unexpected end tag"))?;
                    self.close_element(element)?;
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map_err(|err| ParseError::malformed(self.position(), err.to_string()))?;
                    self.handle_text(&content)?;
                }
                Event::CData(data) => {
                    let content = std::str::from_utf8(&data)
                        .map_err(|err| ParseError::malformed(self.position(), err.to_string()))?
                        .to_string();
                    self.handle_text(&content)?;
                }
                Event::Comment(_) | Event::PI(_) => {
                    self.seen_markup = true;
                }
                Event::Eof => break,
            }
        }

        self.finish()
    }

    fn capture_declaration(&mut self) -> ParseResult<()> {
        let end = self.position();
        if self.seen_markup {
            return Err(ParseError::malformed(
                end,
                "XML declaration must be the first construct",
            ));
        }
        let head = &self.source[..end.min(self.source.len())];
        let start = head
            .rfind("<?xml")
            .ok_or_else(|| ParseError::malformed(end, "unreadable XML declaration"))?;
        self.prolog.declaration = Some(head[start..].to_string());
        self.seen_markup = true;
        Ok(())
    }

    fn capture_doctype(&mut self) -> ParseResult<()> {
        let end = self.position();
        if self.root.is_some() || !self.stack.is_empty() || self.prolog.doctype.is_some() {
            return Err(ParseError::malformed(end, "DOCTYPE must precede the root element"));
        }
        let head = &self.source[..end.min(self.source.len())];
        let start = head
            .rfind("<!DOCTYPE")
            .or_else(|| head.rfind("<!doctype"))
            .ok_or_else(|| ParseError::malformed(end, "unreadable DOCTYPE"))?;
        self.prolog.doctype = Some(head[start..].to_string());
        self.seen_markup = true;
        Ok(())
    }

    fn open_element(&mut self, start: &BytesStart<'_>) -> ParseResult<OpenElement> {
        self.seen_markup = true;
        let position = self.position();
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|err| ParseError::malformed(position, err.to_string()))?
            .to_string();

        let kind: NodeKind = name.parse()?;
        if kind.is_synthetic() {
            return Err(SchemaError::UnknownNodeKind(name).into());
        }

        match self.stack.last() {
            Some(parent) => {
                if !self.schema.content_model(parent.kind).admits(kind) {
                    return Err(ParseError::unexpected_child(
                        parent.kind,
                        kind,
                        format!("<{}> is not allowed in <{}>", kind, parent.kind),
                    ));
                }
            }
            None if self.root.is_some() => {
                return Err(ParseError::malformed(position, "document has more than one root element"));
            }
            None => {
                if !self.schema.content_model(NodeKind::Document).admits(kind) {
                    return Err(ParseError::unexpected_child(
                        NodeKind::Document,
                        kind,
                        format!("<{}> cannot be the root element", kind),
                    ));
                }
            }
        }

        let descriptor = self.schema.lookup(kind);
        let mut attributes = Attributes::new();
        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|err| ParseError::malformed(position, err.to_string()))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|err| ParseError::malformed(position, err.to_string()))?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(|err| ParseError::malformed(position, err.to_string()))?;
            attributes.insert(key, Some(value.into_owned()));
        }
        for (name, value) in descriptor.default_attributes() {
            attributes
                .entry(name.to_string())
                .or_insert_with(|| Some(value.to_string()));
        }

        Ok(OpenElement {
            kind,
            attributes,
            children: Vec::new(),
            admits_text: descriptor.admits_text(),
        })
    }

    fn close_element(&mut self, element: OpenElement) -> ParseResult<()> {
        let model = self.schema.content_model(element.kind);
        model
            .matches(element.children.iter().map(Node::kind))
            .map_err(|mismatch| ParseError::from_mismatch(element.kind, mismatch))?;

        let node = Node::Element {
            kind: element.kind,
            attributes: element.attributes,
            children: element.children,
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
        Ok(())
    }

    fn handle_text(&mut self, content: &str) -> ParseResult<()> {
        if content.is_empty() {
            return Ok(());
        }
        let position = self.position();
        let blank = content.trim().is_empty();
        match self.stack.last_mut() {
            Some(parent) if parent.admits_text => {
                parent.push_text(content);
                Ok(())
            }
            Some(_) if blank => Ok(()),
            Some(parent) => Err(ParseError::unexpected_child(
                parent.kind,
                NodeKind::Text,
                format!("<{}> does not allow text", parent.kind),
            )),
            None if blank => Ok(()),
            None => Err(ParseError::malformed(position, "text outside the root element")),
        }
    }

    fn finish(self) -> ParseResult<Document> {
        let position = self.position();
        if let Some(open) = self.stack.last() {
            return Err(ParseError::malformed(
                position,
                format!("unclosed element <{}>", open.kind),
            ));
        }
        let topic = self
            .root
            .ok_or_else(|| ParseError::malformed(position, "document has no root element"))?;

        debug!(
            root = %topic.kind(),
            default_prolog = self.prolog.is_default(),
            "Parsed document"
        );
        let root = Node::element(NodeKind::Document).with_child(topic);
        Ok(Document::with_prolog(root, self.prolog))
    }
}

/// Parse XDITA source into a JDita document.
pub fn parse(source: &str) -> ParseResult<Document> {
    Parser::new(source).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prolog::{DEFAULT_DECLARATION, DEFAULT_DOCTYPE};
    use petal_schema::DITAARCH_NAMESPACE;

    const SCENARIO_A: &str = r#"<topic id="program"><title>Test File 2</title><body><section><p>A test paragraph.</p></section></body></topic>"#;

    #[test]
    fn test_parse_minimal_topic() {
        let doc = parse(SCENARIO_A).unwrap();
        assert!(doc.prolog.is_default());
        assert_eq!(doc.root.kind(), NodeKind::Document);

        let topic = &doc.root.children()[0];
        assert_eq!(topic.kind(), NodeKind::Topic);
        assert_eq!(topic.attribute("id"), Some("program"));
        assert_eq!(topic.attribute("xmlns:ditaarch"), Some(DITAARCH_NAMESPACE));

        let kinds: Vec<_> = topic.children().iter().map(Node::kind).collect();
        assert_eq!(kinds, vec![NodeKind::Title, NodeKind::Body]);
        assert_eq!(topic.children()[0].text_content(), "Test File 2");

        let p = &topic.children()[1].children()[0].children()[0];
        assert_eq!(p.kind(), NodeKind::P);
        assert_eq!(p.text_content(), "A test paragraph.");
    }

    #[test]
    fn test_prolog_is_captured_verbatim() {
        let source = "<?xml version=\"1.4\" encoding=\"ISO-8859-1\"?>\n<!DOCTYPE topic PUBLIC \"-//CUSTOM//EN\" \"custom.dtd\">\n<topic><title>T</title></topic>";
        let doc = parse(source).unwrap();
        assert_eq!(
            doc.prolog.declaration.as_deref(),
            Some("<?xml version=\"1.4\" encoding=\"ISO-8859-1\"?>")
        );
        assert_eq!(
            doc.prolog.doctype.as_deref(),
            Some("<!DOCTYPE topic PUBLIC \"-//CUSTOM//EN\" \"custom.dtd\">")
        );
    }

    #[test]
    fn test_default_prolog_when_absent() {
        let doc = parse("<topic><title>T</title></topic>").unwrap();
        assert_eq!(doc.prolog.declaration(), DEFAULT_DECLARATION);
        assert_eq!(doc.prolog.doctype(), DEFAULT_DOCTYPE);
    }

    #[test]
    fn test_whitespace_between_blocks_is_dropped() {
        let source = "<topic>\n  <title>T</title>\n  <body>\n    <p>One</p>\n  </body>\n</topic>";
        let doc = parse(source).unwrap();
        let topic = &doc.root.children()[0];
        assert_eq!(topic.children().len(), 2);
        assert_eq!(topic.children()[1].children().len(), 1);
    }

    #[test]
    fn test_mixed_content_is_kept() {
        let doc = parse("<topic><title>T</title><body><p>a <b>bold</b> &amp; <![CDATA[<raw>]]></p></body></topic>").unwrap();
        let p = &doc.root.children()[0].children()[1].children()[0];
        let kinds: Vec<_> = p.children().iter().map(Node::kind).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::B, NodeKind::Text]);
        assert_eq!(p.text_content(), "a bold & <raw>");
    }

    #[test]
    fn test_note_gets_default_type() {
        let doc = parse("<topic><title>T</title><body><note><p>x</p></note></body></topic>").unwrap();
        let note = &doc.root.children()[0].children()[1].children()[0];
        assert_eq!(note.attribute("type"), Some("note"));

        let doc = parse("<topic><title>T</title><body><note type=\"tip\"/></body></topic>").unwrap();
        let note = &doc.root.children()[0].children()[1].children()[0];
        assert_eq!(note.attribute("type"), Some("tip"));
    }

    #[test]
    fn test_missing_required_child() {
        let err = parse("<topic><title>T</title><body><ul/></body></topic>").unwrap_err();
        match err {
            ParseError::SchemaViolation { parent, child, .. } => {
                assert_eq!(parent, NodeKind::Ul);
                assert_eq!(child, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_order_child() {
        let err = parse("<topic><body/><title>T</title></topic>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation {
                parent: NodeKind::Topic,
                child: Some(NodeKind::Body),
                ..
            }
        ));
    }

    #[test]
    fn test_disallowed_child() {
        let err = parse("<topic><title>T</title><body><li/></body></topic>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation {
                parent: NodeKind::Body,
                child: Some(NodeKind::Li),
                ..
            }
        ));
    }

    #[test]
    fn test_text_where_not_allowed() {
        let err = parse("<topic><title>T</title><body>loose</body></topic>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation {
                parent: NodeKind::Body,
                child: Some(NodeKind::Text),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_element() {
        let err = parse("<topic><title>T</title><marquee/></topic>").unwrap_err();
        assert_eq!(
            err,
            ParseError::Schema(SchemaError::UnknownNodeKind("marquee".to_string()))
        );
        let err = parse("<document/>").unwrap_err();
        assert_eq!(
            err,
            ParseError::Schema(SchemaError::UnknownNodeKind("document".to_string()))
        );
    }

    #[test]
    fn test_malformed_input() {
        for source in [
            "<topic><title>T</title>",
            "<topic><title>T</topic>",
            "",
            "just text",
            "<topic><title>T</title></topic><topic><title>U</title></topic>",
        ] {
            assert!(
                matches!(parse(source), Err(ParseError::MalformedXml { .. })),
                "{:?} should be malformed",
                source
            );
        }
    }
}
