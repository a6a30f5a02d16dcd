//! Error types for diagram editing, persistence and configuration.

use std::io;

use thiserror::Error;

use crate::model::{NodeId, RelationshipId, RelationshipKind};

/// The main error type for engine operations.
///
/// Geometry never fails; every variant here is raised where names are
/// resolved, records are edited, or files are touched.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("relationship endpoint `{0}` is not on the diagram")]
    MissingEndpoint(String),

    #[error("an element named `{0}` already exists")]
    DuplicateName(String),

    #[error("element names must not be empty")]
    EmptyName,

    #[error("no element with id {0}")]
    UnknownNode(NodeId),

    #[error("no element named `{0}`")]
    UnknownElement(String),

    #[error("no relationship with id {0}")]
    UnknownRelationship(RelationshipId),

    #[error("unknown relationship type `{0}`")]
    UnknownKind(String),

    #[error("the {0} builder was already used for this activation")]
    BuilderSpent(RelationshipKind),

    #[error("interface `{0}` cannot carry attributes")]
    AttributeOnInterface(String),

    #[error("member index {index} is out of range for `{name}`")]
    MemberOutOfRange { name: String, index: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML read error: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

pub type Result<T, E = DiagramError> = std::result::Result<T, E>;
