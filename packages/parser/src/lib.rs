//! # Petal Parser
//!
//! Converts XDITA (LwDITA XML) text to the JDita abstract tree and back.
//!
//! ```text
//! XML text ──quick-xml──▶ Parser ──Schema──▶ Document { prolog, root }
//!                                                 │
//! XML text ◀──────────── Serializer ◀─────────────┘
//! ```
//!
//! The XML declaration and DOCTYPE are carried on [`Prolog`] and re-emitted
//! byte for byte; documents without them get the canonical LwDITA pair.

pub mod ast;
pub mod error;
pub mod parser;
pub mod prolog;
pub mod serializer;
pub mod visitor;

#[cfg(test)]
mod tests_serializer;

pub use ast::{Attributes, Document, Node};
pub use error::{ParseError, ParseResult};
pub use parser::{parse, Parser};
pub use prolog::{Prolog, DEFAULT_DECLARATION, DEFAULT_DOCTYPE};
pub use serializer::{serialize, Serializer};
pub use visitor::{collect_text, normalize_text, stats, validate, DocumentStats, Visitor, VisitorMut};
