//! # Document Handle
//!
//! A Document represents a single XDITA file and its editing state.
//! Documents can be:
//! - **Memory-backed**: Temporary, for testing or in-memory operations
//! - **File-backed**: Single-user editing with disk persistence
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Convert → Edit → Convert → Serialize → Save
//!   ↓      ↓        ↓        ↓       ↓          ↓         ↓
//! File   JDita  Editable  Commands  JDita     XML       File
//! ```

use crate::commands::{CommandEngine, CommandOptions};
use crate::config::EditorConfig;
use crate::convert::{to_abstract, to_editable};
use crate::mutations::{Command, CommandOutcome};
use crate::tree::EditableTree;
use crate::EditorError;
use petal_parser::{normalize_text, parse, serialize, validate, Document as JDitaDocument, Prolog};
use petal_schema::Schema;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Editable LwDITA document
#[derive(Debug)]
pub struct Document {
    /// Path to source file (if any)
    pub path: PathBuf,

    /// Current version number (increments on each command)
    pub version: u64,

    /// Backing storage strategy
    storage: DocumentStorage,

    engine: CommandEngine,
}

/// Storage backend for document
#[derive(Debug)]
pub enum DocumentStorage {
    /// In-memory only (for testing, temp docs)
    Memory { prolog: Prolog, tree: EditableTree },

    /// File-backed (single-user editing)
    File {
        prolog: Prolog,
        tree: EditableTree,
        dirty: bool,
    },
}

fn editable_from_source(source: &str) -> Result<(Prolog, EditableTree), EditorError> {
    let jdita = parse(source)?;
    let tree = EditableTree::new(to_editable(Schema::lwdita(), &jdita.root));
    Ok((jdita.prolog, tree))
}

impl Document {
    /// Create document from source text (memory-backed)
    pub fn from_source(path: PathBuf, source: &str) -> Result<Self, EditorError> {
        let (prolog, tree) = editable_from_source(source)?;

        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::Memory { prolog, tree },
            engine: CommandEngine::default(),
        })
    }

    /// Load document from file (file-backed). Reads `petal.config.json`
    /// from the file's directory when present.
    pub fn load(path: PathBuf) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(&path)?;
        let config = match path.parent() {
            Some(dir) => EditorConfig::load(dir)?,
            None => EditorConfig::default(),
        };
        let (prolog, tree) = editable_from_source(&source)?;
        info!(path = %path.display(), "Loaded document");

        Ok(Self {
            path,
            version: 0,
            storage: DocumentStorage::File {
                prolog,
                tree,
                dirty: false,
            },
            engine: CommandEngine::new(Schema::lwdita(), CommandOptions::from(&config)),
        })
    }

    /// Replace the command options, e.g. from an explicit config
    pub fn with_config(mut self, config: &EditorConfig) -> Self {
        self.engine = CommandEngine::new(Schema::lwdita(), CommandOptions::from(config));
        self
    }

    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    pub fn prolog(&self) -> &Prolog {
        match &self.storage {
            DocumentStorage::Memory { prolog, .. } | DocumentStorage::File { prolog, .. } => prolog,
        }
    }

    /// Current editable tree
    pub fn tree(&self) -> &EditableTree {
        match &self.storage {
            DocumentStorage::Memory { tree, .. } | DocumentStorage::File { tree, .. } => tree,
        }
    }

    /// Accept a tree produced by the editing surface
    pub fn set_tree(&mut self, new_tree: EditableTree) -> u64 {
        self.version += 1;
        self.store(new_tree);
        self.version
    }

    fn store(&mut self, new_tree: EditableTree) {
        match &mut self.storage {
            DocumentStorage::Memory { tree, .. } => *tree = new_tree,
            DocumentStorage::File { tree, dirty, .. } => {
                *tree = new_tree;
                *dirty = true;
            }
        }
    }

    /// Apply a structural command. The version advances even when the
    /// command is rejected; the tree only changes on success.
    #[instrument(skip(self, command), fields(version = self.version))]
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, EditorError> {
        self.version += 1;

        let new_tree = command.run(&self.engine, self.tree())?;
        self.store(new_tree);

        Ok(CommandOutcome {
            version: self.version,
        })
    }

    /// The current tree as a validated JDita document
    pub fn to_jdita(&self) -> Result<JDitaDocument, EditorError> {
        let root = to_abstract(Schema::lwdita(), self.tree().root())?;
        let mut jdita = JDitaDocument::with_prolog(root, self.prolog().clone());
        normalize_text(&mut jdita);
        validate(&jdita)?;
        Ok(jdita)
    }

    /// Serialize the current tree, prolog first
    pub fn to_xml(&self) -> Result<String, EditorError> {
        Ok(serialize(&self.to_jdita()?))
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            _ => false,
        }
    }

    /// Save document to disk (if file-backed)
    pub fn save(&mut self) -> Result<(), EditorError> {
        let xml = self.to_xml()?;
        match &mut self.storage {
            DocumentStorage::File { dirty, .. } => {
                std::fs::write(&self.path, xml)?;
                *dirty = false;
                info!(path = %self.path.display(), "Saved document");
                Ok(())
            }
            _ => Err(EditorError::NotFileBacked),
        }
    }
}
