//! Content-model pattern syntax.
//!
//! A pattern is a sequence of terms. Each term is a kind name, a `%group`
//! reference or a parenthesised alternation of those, optionally followed by
//! `?`, `*` or `+`:
//!
//! ```text
//! title? desc? (%fig-blocks | image | xref)*
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::kind::NodeKind;
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum PatternToken<'src> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("|")]
    Pipe,

    #[token("?")]
    Optional,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[regex(r"%[a-z][a-z-]*", |lex| &lex.slice()[1..])]
    Group(&'src str),

    #[regex(r"[a-z][a-z-]*", |lex| lex.slice())]
    Name(&'src str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    pub fn min(self) -> usize {
        match self {
            Quantifier::One | Quantifier::OneOrMore => 1,
            Quantifier::Optional | Quantifier::ZeroOrMore => 0,
        }
    }

    pub fn max(self) -> Option<usize> {
        match self {
            Quantifier::One | Quantifier::Optional => Some(1),
            Quantifier::ZeroOrMore | Quantifier::OneOrMore => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Quantifier::One => "",
            Quantifier::Optional => "?",
            Quantifier::ZeroOrMore => "*",
            Quantifier::OneOrMore => "+",
        }
    }
}

/// A term with its group references already expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTerm {
    pub alternatives: Vec<NodeKind>,
    pub quantifier: Quantifier,
}

/// Recursive-descent parser over the pattern tokens of one node kind.
pub struct PatternParser<'src, G> {
    owner: NodeKind,
    tokens: Vec<(PatternToken<'src>, Range<usize>)>,
    pos: usize,
    end: usize,
    resolve_group: G,
}

impl<'src, G> PatternParser<'src, G>
where
    G: Fn(&str) -> Option<&'static [NodeKind]>,
{
    pub fn new(owner: NodeKind, source: &'src str, resolve_group: G) -> SchemaResult<Self> {
        let mut tokens = Vec::new();
        for (token, span) in PatternToken::lexer(source).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(SchemaError::invalid_pattern(
                        owner,
                        span.start,
                        format!("unexpected character '{}'", &source[span.clone()]),
                    ))
                }
            }
        }

        Ok(Self {
            owner,
            tokens,
            pos: 0,
            end: source.len(),
            resolve_group,
        })
    }

    pub fn parse(mut self) -> SchemaResult<Vec<PatternTerm>> {
        let mut terms = Vec::new();
        while self.pos < self.tokens.len() {
            terms.push(self.parse_term()?);
        }
        Ok(terms)
    }

    fn parse_term(&mut self) -> SchemaResult<PatternTerm> {
        let alternatives = match self.advance() {
            Some(PatternToken::LParen) => self.parse_alternation()?,
            Some(PatternToken::Name(name)) => vec![self.resolve_name(name)?],
            Some(PatternToken::Group(group)) => self.resolve_group(group)?,
            Some(other) => {
                return Err(self.error_at_previous(format!("expected a term, found {:?}", other)))
            }
            None => return Err(self.error_at_end("expected a term")),
        };

        let quantifier = match self.peek() {
            Some(PatternToken::Optional) => Quantifier::Optional,
            Some(PatternToken::Star) => Quantifier::ZeroOrMore,
            Some(PatternToken::Plus) => Quantifier::OneOrMore,
            _ => Quantifier::One,
        };
        if quantifier != Quantifier::One {
            self.pos += 1;
        }

        Ok(PatternTerm {
            alternatives,
            quantifier,
        })
    }

    fn parse_alternation(&mut self) -> SchemaResult<Vec<NodeKind>> {
        let mut alternatives: Vec<NodeKind> = Vec::new();
        loop {
            let expanded = match self.advance() {
                Some(PatternToken::Name(name)) => vec![self.resolve_name(name)?],
                Some(PatternToken::Group(group)) => self.resolve_group(group)?,
                Some(other) => {
                    return Err(self.error_at_previous(format!(
                        "expected a name or group inside parentheses, found {:?}",
                        other
                    )))
                }
                None => return Err(self.error_at_end("unclosed '('")),
            };
            for kind in expanded {
                if !alternatives.contains(&kind) {
                    alternatives.push(kind);
                }
            }

            match self.advance() {
                Some(PatternToken::Pipe) => continue,
                Some(PatternToken::RParen) => return Ok(alternatives),
                Some(other) => {
                    return Err(
                        self.error_at_previous(format!("expected '|' or ')', found {:?}", other))
                    )
                }
                None => return Err(self.error_at_end("unclosed '('")),
            }
        }
    }

    fn resolve_name(&self, name: &str) -> SchemaResult<NodeKind> {
        name.parse::<NodeKind>()
            .map_err(|_| SchemaError::DanglingReference {
                kind: self.owner,
                reference: name.to_string(),
            })
    }

    fn resolve_group(&self, group: &str) -> SchemaResult<Vec<NodeKind>> {
        (self.resolve_group)(group)
            .map(|kinds| kinds.to_vec())
            .ok_or_else(|| SchemaError::DanglingReference {
                kind: self.owner,
                reference: format!("%{}", group),
            })
    }

    fn peek(&self) -> Option<PatternToken<'src>> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn advance(&mut self) -> Option<PatternToken<'src>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error_at_previous(&self, message: String) -> SchemaError {
        let pos = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| span.start)
            .unwrap_or(self.end);
        SchemaError::invalid_pattern(self.owner, pos, message)
    }

    fn error_at_end(&self, message: &str) -> SchemaError {
        SchemaError::invalid_pattern(self.owner, self.end, message)
    }
}

/// Parse `source` into expanded terms for `owner`.
pub fn parse_pattern<G>(owner: NodeKind, source: &str, resolve_group: G) -> SchemaResult<Vec<PatternTerm>>
where
    G: Fn(&str) -> Option<&'static [NodeKind]>,
{
    PatternParser::new(owner, source, resolve_group)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INLINE: &[NodeKind] = &[NodeKind::Text, NodeKind::B];

    fn groups(name: &str) -> Option<&'static [NodeKind]> {
        match name {
            "inline" => Some(INLINE),
            _ => None,
        }
    }

    #[test]
    fn test_tokenizer_basic() {
        let tokens: Vec<_> = PatternToken::lexer("title? (%inline | xref)*")
            .map(|token| token.unwrap())
            .collect();
        assert_eq!(
            tokens,
            vec![
                PatternToken::Name("title"),
                PatternToken::Optional,
                PatternToken::LParen,
                PatternToken::Group("inline"),
                PatternToken::Pipe,
                PatternToken::Name("xref"),
                PatternToken::RParen,
                PatternToken::Star,
            ]
        );
    }

    #[test]
    fn test_parse_sequence_with_quantifiers() {
        let terms = parse_pattern(NodeKind::Topic, "title shortdesc? prolog* body+", groups).unwrap();
        let quantifiers: Vec<_> = terms.iter().map(|t| t.quantifier).collect();
        assert_eq!(
            quantifiers,
            vec![
                Quantifier::One,
                Quantifier::Optional,
                Quantifier::ZeroOrMore,
                Quantifier::OneOrMore
            ]
        );
        assert_eq!(terms[3].alternatives, vec![NodeKind::Body]);
    }

    #[test]
    fn test_groups_expand_without_duplicates() {
        let terms = parse_pattern(NodeKind::P, "(%inline | text | xref)*", groups).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(
            terms[0].alternatives,
            vec![NodeKind::Text, NodeKind::B, NodeKind::Xref]
        );
    }

    #[test]
    fn test_empty_pattern_has_no_terms() {
        let terms = parse_pattern(NodeKind::MediaSource, "", groups).unwrap();
        assert!(terms.is_empty());
    }

    #[test]
    fn test_dangling_name_is_reported() {
        let err = parse_pattern(NodeKind::Body, "section* marquee", groups).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DanglingReference {
                kind: NodeKind::Body,
                reference: "marquee".to_string()
            }
        );
    }

    #[test]
    fn test_dangling_group_is_reported() {
        let err = parse_pattern(NodeKind::Body, "(%nope)*", groups).unwrap_err();
        assert!(matches!(err, SchemaError::DanglingReference { reference, .. } if reference == "%nope"));
    }

    #[test]
    fn test_unclosed_paren_is_invalid() {
        let err = parse_pattern(NodeKind::P, "(text | b", groups).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { pos: 9, .. }));
    }

    #[test]
    fn test_stray_quantifier_is_invalid() {
        let err = parse_pattern(NodeKind::P, "* text", groups).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { pos: 0, .. }));
    }

    #[test]
    fn test_unexpected_character_is_invalid() {
        let err = parse_pattern(NodeKind::P, "text, b", groups).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { pos: 4, .. }));
    }
}
