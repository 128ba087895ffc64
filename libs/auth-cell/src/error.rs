use thiserror::Error;

use shared_models::error::AppError;
use shared_utils::token::TokenError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("User with this email already exists")]
    DuplicateEmail,

    #[error("Failed to access session storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid session token: {0}")]
    Decode(#[from] TokenError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::InvalidCredentials(msg) => AppError::Auth(msg),
            AuthError::DuplicateEmail => AppError::Conflict(err.to_string()),
            AuthError::Storage(_) => AppError::Internal(err.to_string()),
            AuthError::Decode(_) => AppError::Auth("Invalid token".to_string()),
        }
    }
}
