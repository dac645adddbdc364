/// Round-trip tests: serialize(parse(x)) must be a fixed point
use crate::*;

const CUSTOM_DECLARATION: &str = r#"<?xml version="1.4" encoding="UTF-8" standalone="no"?>"#;
const CUSTOM_DOCTYPE: &str =
    r#"<!DOCTYPE topic PUBLIC "-//ACME//DTD Custom Topic//EN" "acme-topic.dtd">"#;

fn roundtrip(source: &str) -> String {
    let doc = parse(source).unwrap_or_else(|err| panic!("Failed to parse {:?}: {}", source, err));
    serialize(&doc)
}

#[test]
fn test_roundtrip_is_idempotent() {
    let sources = vec![
        r#"<topic id="program"><title>Test File 2</title><body><section><p>A test paragraph.</p></section></body></topic>"#,
        "<topic>\n  <title>Indented</title>\n  <body>\n    <p>One</p>\n    <ul>\n      <li><p>Item</p></li>\n    </ul>\n  </body>\n</topic>",
        r#"<topic><title>Mixed <b>bold</b> and <i>italic</i></title><shortdesc>Short</shortdesc><body><p>Text with <xref href="http://example.com">a link</xref>.</p></body></topic>"#,
        r#"<topic><title>Media</title><body><video width="640"><desc>Clip</desc><video-poster value="poster.png"/><media-source value="clip.mp4"/></video></body></topic>"#,
        r#"<topic><title>Table</title><body><simpletable><sthead><stentry><p>H</p></stentry></sthead><strow><stentry><p>C</p></stentry></strow></simpletable></body></topic>"#,
        r#"<topic><title>Defs</title><body><dl><dlentry><dt>Term</dt><dd><p>Definition</p></dd></dlentry></dl><fn id="f1"><p>Note</p></fn></body></topic>"#,
        "<topic><title>Code</title><body><pre xml:space=\"preserve\">fn main() {\n    a &lt; b\n}</pre></body></topic>",
    ];

    for source in sources {
        let first = roundtrip(source);
        let second = roundtrip(&first);
        assert_eq!(first, second, "not a fixed point for {:?}", source);
        assert_eq!(parse(&first).unwrap(), parse(&second).unwrap());
    }
}

#[test]
fn test_canonical_output_roundtrips_exactly() {
    let doc = parse("<topic id=\"t\"><title>T</title><body><p>x &amp; y</p></body></topic>").unwrap();
    let canonical = serialize(&doc);
    assert_eq!(
        canonical,
        format!(
            "{}\n{}\n<topic id=\"t\" xmlns:ditaarch=\"{}\"><title>T</title><body><p>x &amp; y</p></body></topic>",
            DEFAULT_DECLARATION,
            DEFAULT_DOCTYPE,
            petal_schema::DITAARCH_NAMESPACE
        )
    );
    assert_eq!(roundtrip(&canonical), canonical);
}

#[test]
fn test_custom_prolog_is_preserved_byte_for_byte() {
    let source = format!(
        "{}\n{}\n<topic><title>Custom</title></topic>",
        CUSTOM_DECLARATION, CUSTOM_DOCTYPE
    );
    let output = roundtrip(&source);
    assert!(output.starts_with(&format!("{}\n{}\n", CUSTOM_DECLARATION, CUSTOM_DOCTYPE)));
    assert!(!output.contains(DEFAULT_DECLARATION));
}

#[test]
fn test_default_prolog_is_emitted_when_absent() {
    let output = roundtrip("<topic><title>Plain</title></topic>");
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some(DEFAULT_DECLARATION));
    assert_eq!(lines.next(), Some(DEFAULT_DOCTYPE));
}

#[test]
fn test_declaration_only_keeps_default_doctype() {
    let source = format!("{}<topic><title>T</title></topic>", CUSTOM_DECLARATION);
    let output = roundtrip(&source);
    assert!(output.starts_with(&format!("{}\n{}\n", CUSTOM_DECLARATION, DEFAULT_DOCTYPE)));
}

#[test]
fn test_document_holds_exactly_one_topic() {
    let topic = |title: &str| {
        Node::element(petal_schema::NodeKind::Topic)
            .with_child(Node::element(petal_schema::NodeKind::Title).with_child(Node::text(title)))
    };
    let doc = Document::new(
        Node::element(petal_schema::NodeKind::Document)
            .with_child(topic("One"))
            .with_child(topic("Two")),
    );
    assert!(matches!(
        validate(&doc),
        Err(ParseError::SchemaViolation {
            parent: petal_schema::NodeKind::Document,
            child: Some(petal_schema::NodeKind::Topic),
            ..
        })
    ));

    let single = Document::new(Node::element(petal_schema::NodeKind::Document).with_child(topic("One")));
    let output = serialize(&single);
    assert!(output.ends_with("<topic><title>One</title></topic>"));
    assert!(parse(&output).is_ok());
}

#[test]
fn test_json_roundtrip_keeps_prolog() {
    let source = format!("{}\n<topic><title>J</title></topic>", CUSTOM_DECLARATION);
    let doc = parse(&source).unwrap();
    let json = doc.to_json().unwrap();
    let back = Document::from_json(&json).unwrap();
    assert_eq!(back, doc);
    assert_eq!(serialize(&back), serialize(&doc));
}
