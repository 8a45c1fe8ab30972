//! Store-level outcomes.
//!
//! `sea_orm::DbErr` never leaves this crate; it is translated here into the
//! small closed set callers reason about.

use sea_orm::{DbErr, SqlErr};
use splittrip_shared::AppError;
use thiserror::Error;

/// Result type alias using `StoreError`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a failed store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Targeted row absent, or a targeted write touched zero rows.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation, or a delete blocked by references.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insert or update referenced a missing row.
    #[error("referenced row missing: {0}")]
    ForeignKeyMissing(String),

    /// Pool exhausted or connection lost; safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("store failure: {0}")]
    Internal(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => return Self::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return Self::ForeignKeyMissing(msg);
            }
            _ => {}
        }
        match err {
            DbErr::RecordNotFound(msg) => Self::NotFound(msg),
            DbErr::RecordNotUpdated => Self::NotFound("record not updated".to_string()),
            DbErr::ConnectionAcquire(e) => Self::Unavailable(e.to_string()),
            DbErr::Conn(e) => Self::Unavailable(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Translates an error raised by a delete.
///
/// A foreign-key violation there means other rows still reference the target.
#[must_use]
pub fn translate_delete(err: DbErr) -> StoreError {
    match StoreError::from(err) {
        StoreError::ForeignKeyMissing(msg) => {
            StoreError::Conflict(format!("still referenced: {msg}"))
        }
        other => other,
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::ForeignKeyMissing(msg) => Self::NotFound(msg),
            StoreError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Store unavailable");
                Self::Unavailable(msg)
            }
            StoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Store failure");
                Self::Internal("database error".to_string())
            }
        }
    }
}
