//! Error types for the boolean manager.

use meshbool_scene::SceneError;
use thiserror::Error;

/// A geometry kernel could not evaluate an operation.
///
/// Recoverable: Apply drops the failing operation and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// An operand has degenerate geometry.
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    /// The result would contain no geometry.
    #[error("operation produced an empty result")]
    EmptyResult,

    /// A boolean was evaluated without its source operand.
    #[error("boolean source is missing")]
    MissingSource,

    /// The kernel does not know how to evaluate this operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// A command was invoked in a state it cannot act on.
///
/// These surface to the user as warnings, never as hard errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// Fewer than two eligible meshes.
    #[error("At least 2 mesh objects must be selected")]
    InsufficientSelection,

    /// Select-linked grew the edit selection to the whole mesh.
    #[error("All vertices of object became selected")]
    AllVerticesSelected,

    /// Edit mode with nothing selected on the active mesh.
    #[error("Nothing is selected")]
    NothingSelected,

    /// The command only runs in object mode.
    #[error("Apply requires object mode")]
    NotInObjectMode,

    /// There is no active mesh entity.
    #[error("An active mesh object is required")]
    NoActiveMesh,
}

/// Configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`crate::BoolConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned by boolean manager commands.
#[derive(Error, Debug)]
pub enum BoolError {
    /// Scene consistency error.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// User precondition not met.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A stack entry a modal operator drives has disappeared.
    #[error("operation {operation} not found on {entity}")]
    MissingOperation {
        /// Owning entity name.
        entity: String,
        /// Operation name.
        operation: String,
    },
}

/// Result type for boolean manager operations.
pub type Result<T> = std::result::Result<T, BoolError>;
