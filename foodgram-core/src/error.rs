use thiserror::Error;

/// Failure reported by a [`crate::store::Store`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist. Carries the constraint name.
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    /// The row targeted by an update vanished.
    #[error("Row not found")]
    NotFound,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }
}

/// Map a store failure on an insert guarded by a uniqueness rule to `Conflict`.
pub(crate) fn conflict_on_unique(message: &str) -> impl FnOnce(StoreError) -> Error + '_ {
    move |err| match err {
        StoreError::UniqueViolation(_) => Error::Conflict(message.to_string()),
        other => Error::Store(other),
    }
}
