//! # Petal Schema
//!
//! Node registry and content-model validation for LwDITA (XDITA) documents.
//!
//! ```text
//! pattern source ──logos──▶ tokens ──parser──▶ terms ──▶ ContentModel (FSM)
//!                                                              │
//!                           NodeKind ──node_spec──▶ Descriptor ┘
//! ```
//!
//! Both the XML parser (validation on load) and the editor's command engine
//! (legality of insertions) consult the same [`Schema`].

pub mod content_model;
pub mod error;
pub mod kind;
pub mod pattern;
pub mod registry;

pub use content_model::{ContentModel, MatchState, Mismatch, Term};
pub use error::{SchemaError, SchemaResult};
pub use kind::NodeKind;
pub use pattern::{PatternToken, Quantifier};
pub use registry::{AttributeSpec, Descriptor, Schema, DITAARCH_NAMESPACE};
