use thiserror::Error;

use crate::domain::entities::invite::InviteRejection;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing, or owned by someone else. Ownership failures collapse into
    /// this on purpose so callers cannot probe for records they cannot see.
    #[error("Not found")]
    NotFound,

    /// Used only where the record's existence is already known to the caller
    /// and the denial leaks nothing.
    #[error("Not allowed")]
    OwnershipViolation,

    /// A foreign key supplied by the caller does not resolve inside the
    /// caller's own partition, e.g. a subscription naming a payment method
    /// it does not own.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invite invalid: {0}")]
    InviteInvalid(InviteRejection),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    InvalidInput,
    NotFound,
    OwnershipViolation,
    InvalidReference,
    InviteInvalid,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::OwnershipViolation => "OWNERSHIP_VIOLATION",
            ErrorCode::InvalidReference => "INVALID_REFERENCE",
            ErrorCode::InviteInvalid => "INVITE_INVALID",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::OwnershipViolation => ErrorCode::OwnershipViolation,
            AppError::InvalidReference(_) => ErrorCode::InvalidReference,
            AppError::InviteInvalid(_) => ErrorCode::InviteInvalid,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
