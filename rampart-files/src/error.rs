//! Error types for file validation

use rampart_validation::ValidatorError;
use thiserror::Error;

/// File validation error types
#[derive(Error, Debug)]
pub enum FileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input matches none of the supported upload shapes
    #[error("{0}")]
    InvalidShape(String),

    /// Upload stream exposes no `uri` metadata
    #[error("Uploaded file stream does not expose a uri")]
    MissingUri,

    /// Validator configuration error
    #[error(transparent)]
    Validator(#[from] ValidatorError),
}

impl FileError {
    pub(crate) fn files_format() -> Self {
        FileError::InvalidShape("Value array must be in $_FILES format".to_string())
    }
}

impl From<FileError> for ValidatorError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::Validator(inner) => inner,
            other => ValidatorError::InvalidArgument(other.to_string()),
        }
    }
}

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;
