use petal_schema::{Mismatch, NodeKind, SchemaError};
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed XML at {position}: {message}")]
    MalformedXml { position: usize, message: String },

    #[error("Schema violation in <{parent}>: {reason}")]
    SchemaViolation {
        parent: NodeKind,
        /// The offending child, or `None` when a required child is missing.
        child: Option<NodeKind>,
        reason: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ParseError {
    pub fn malformed(position: usize, message: impl Into<String>) -> Self {
        Self::MalformedXml {
            position,
            message: message.into(),
        }
    }

    pub fn unexpected_child(parent: NodeKind, child: NodeKind, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            parent,
            child: Some(child),
            reason: reason.into(),
        }
    }

    pub fn from_mismatch(parent: NodeKind, mismatch: Mismatch) -> Self {
        let reason = mismatch.to_string();
        match mismatch {
            Mismatch::Unexpected { kind, .. } => Self::SchemaViolation {
                parent,
                child: Some(kind),
                reason,
            },
            Mismatch::Missing { .. } => Self::SchemaViolation {
                parent,
                child: None,
                reason,
            },
        }
    }
}
