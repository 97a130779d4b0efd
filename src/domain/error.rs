//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent violations of the forest's structural contract.
///
/// The selection engine itself is total; these only arise while building a
/// forest or when a caller refers to a node that does not exist.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("parent of node {0} is not in the forest")]
    InvalidParent(NodeId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;
