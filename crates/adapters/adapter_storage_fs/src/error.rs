//! Storage-specific error type wrapping file system errors.

use stepwise_domain::error::DomainError;

/// Errors originating from the file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or listing a file failed.
    #[error("io error on `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The requested name is not a plain file name.
    #[error("invalid file name `{0}`")]
    InvalidFileName(String),
}

impl StorageError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
