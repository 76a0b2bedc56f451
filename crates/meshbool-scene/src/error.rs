//! Error types for the scene store.

use thiserror::Error;

use crate::{EntityId, GroupId};

/// Errors raised by structural scene operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The entity handle does not resolve.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// The group handle does not resolve.
    #[error("group not found: {0:?}")]
    GroupNotFound(GroupId),

    /// The entity is still the target of one or more operations.
    #[error("{name} is still referenced by {count} operation(s)")]
    StillReferenced {
        /// Entity name.
        name: String,
        /// Number of referencing operations.
        count: usize,
    },

    /// The entity lives in a group that is hidden from the viewport.
    #[error("cannot remove {entity}: group {group} is hidden from the viewport")]
    GroupHidden {
        /// Entity name.
        entity: String,
        /// Hidden group name.
        group: String,
    },

    /// An operation points at an entity that no longer exists.
    #[error("operation {operation} on {entity} references a missing entity")]
    DanglingReference {
        /// Owning entity name.
        entity: String,
        /// Operation name.
        operation: String,
    },

    /// Boolean operations on an entity are interleaved with other operations.
    #[error("boolean operations on {entity} are not contiguous")]
    NonContiguousBooleans {
        /// Entity name.
        entity: String,
    },

    /// A name was empty or otherwise unusable.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// The scene root group cannot be removed.
    #[error("the scene root group cannot be deleted")]
    RootGroup,
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
