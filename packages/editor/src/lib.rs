//! # Petal Editor
//!
//! Editing core for LwDITA documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: XDITA text ⇄ JDita tree + prolog    │
//! └─────────────────────────────────────────────┘
//!                     ⇅ convert
//! ┌─────────────────────────────────────────────┐
//! │ editor: editable tree + structural commands │
//! │  - Load/save documents                      │
//! │  - Plan insertions against the schema       │
//! │  - Persistent trees, atomic commands        │
//! └─────────────────────────────────────────────┘
//!                     ⇅ JSON
//! ┌─────────────────────────────────────────────┐
//! │ editing surface (owns text edits/selection) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use petal_editor::{Command, Document, InsertionContext};
//! use petal_schema::NodeKind;
//!
//! let mut doc = Document::load("intro.dita".into())?;
//!
//! // Add a list after the first block of the body
//! doc.apply(Command::Create {
//!     kind: NodeKind::Ul,
//!     context: InsertionContext::new(vec![0, 1], 1),
//! })?;
//!
//! doc.save()?;
//! ```

mod commands;
mod config;
mod convert;
mod document;
mod errors;
mod mutations;
mod tree;

pub use commands::{
    CommandEngine, CommandError, CommandOptions, CommandResult, InsertionContext, InsertionPlan,
};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use convert::{
    css_token, presentation_class, to_abstract, to_abstract_as, to_editable, ConvertError,
    ConvertResult, DATA_CLASS, SURFACE_ATTR_PREFIX,
};
pub use document::{Document, DocumentStorage};
pub use errors::EditorError;
pub use mutations::{Command, CommandOutcome};
pub use tree::{child_kinds, kind_of, Attrs, EditableNode, EditableTree, ROOT_TAG, TEXT_TAG};

// Re-export common types for convenience
pub use petal_parser::Document as JDitaDocument;
