use crate::errors::repository::RepositoryError;
use jsonwebtoken::errors::Error as JwtError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepositoryError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Not enough balance. Need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid Token")]
    InvalidTokenType,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Custom error: {0}")]
    Custom(String),
}
