use crate::metadata::ParseError;
use std::fmt;
use thiserror::Error;

/// The kind of entity an id was expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Note,
    Tag,
    Category,
    Directory,
    /// A tree node whose kind cannot be told, because it does not exist.
    Node,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Note => "Note",
            EntityKind::Tag => "Tag",
            EntityKind::Category => "Category",
            EntityKind::Directory => "Directory",
            EntityKind::Node => "Node",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("The character sequence \"{sequence}\" is not allowed in {field}")]
    ForbiddenSequence {
        sequence: &'static str,
        field: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} with id {id} doesn't exist")]
    UnknownId { kind: EntityKind, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    MetadataParse(#[from] ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl WikiError {
    pub fn unknown(kind: EntityKind, id: impl Into<String>) -> Self {
        WikiError::UnknownId {
            kind,
            id: id.into(),
        }
    }

    /// True for the "id not found" family of errors.
    pub fn is_unknown_id(&self) -> bool {
        matches!(self, WikiError::UnknownId { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WikiError::ForbiddenSequence { .. } | WikiError::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WikiError>;
