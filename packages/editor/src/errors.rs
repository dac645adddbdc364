//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] petal_parser::ParseError),

    #[error("Conversion error: {0}")]
    Convert(#[from] crate::convert::ConvertError),

    #[error("Command error: {0}")]
    Command(#[from] crate::commands::CommandError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Document is not file-backed")]
    NotFileBacked,
}
