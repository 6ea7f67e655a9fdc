//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`DomainError`] via `#[from]` (or an explicit `From` impl for adapter
//! errors, which are boxed into [`DomainError::Storage`] /
//! [`DomainError::Backend`]).

use crate::id::StepId;

/// Top-level error shared by the domain, application and adapter crates.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A persisted automation could not be loaded.
    #[error("cannot load automation")]
    Document(#[from] DocumentError),

    /// An edit was refused because it would break an invariant.
    #[error("conflicting change")]
    Conflict(#[from] ConflictError),

    /// The referenced item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The persistence adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The input-injection backend failed.
    #[error("input backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why an automation document was rejected.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The text is not JSON, or does not match the document schema.
    #[error("malformed automation document")]
    Json(#[from] serde_json::Error),

    /// A numeric field is above [`MAX_SAFE_INTEGER`](crate::id::MAX_SAFE_INTEGER).
    #[error("field `{field}` holds {value}, above the safe integer range")]
    UnsafeInteger { field: &'static str, value: u64 },

    /// Two steps share the same id.
    #[error("step id {0} is used more than once")]
    DuplicateStepId(StepId),
}

/// Recoverable editor-level conflicts. The state is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ConflictError {
    #[error("variable `{name}` is already owned by step {owner}")]
    VariableOwned { name: String, owner: StepId },

    #[error("step id {0} is already in use")]
    StepIdTaken(StepId),

    #[error("step {0} cannot hold nested steps")]
    NotAContainer(StepId),

    #[error("pointer position ({x}, {y}) is outside the screen")]
    PointerOutOfBounds { x: u64, y: u64 },

    #[error("file `{file_name}` already exists")]
    FileExists { file_name: String },
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    #[must_use]
    pub fn step(id: StepId) -> Self {
        Self {
            entity: "Step",
            id: id.to_string(),
        }
    }
}
