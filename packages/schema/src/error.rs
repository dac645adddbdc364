use crate::kind::NodeKind;
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    #[error("Unknown presentation name '{name}'{}", parent_suffix(.parent))]
    UnknownPresentationName {
        name: String,
        parent: Option<NodeKind>,
    },

    #[error("Presentation name '{name}' is shared by {candidates:?}{}", parent_suffix(.parent))]
    AmbiguousPresentationName {
        name: String,
        parent: Option<NodeKind>,
        candidates: Vec<NodeKind>,
    },

    #[error("Invalid content model for {kind} at {pos}: {message}")]
    InvalidPattern {
        kind: NodeKind,
        pos: usize,
        message: String,
    },

    #[error("Content model of {kind} references unknown '{reference}'")]
    DanglingReference { kind: NodeKind, reference: String },
}

fn parent_suffix(parent: &Option<NodeKind>) -> String {
    match parent {
        Some(kind) => format!(" under {}", kind),
        None => String::new(),
    }
}

impl SchemaError {
    pub fn unknown_presentation(name: impl Into<String>, parent: Option<NodeKind>) -> Self {
        Self::UnknownPresentationName {
            name: name.into(),
            parent,
        }
    }

    pub fn invalid_pattern(kind: NodeKind, pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            kind,
            pos,
            message: message.into(),
        }
    }
}
