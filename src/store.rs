//! Store adapter error classification.
//!
//! Every `DbErr` leaving sea-orm is tagged with a [`StoreErrorKind`] here, from
//! the error variant or the SQLSTATE class the server reported. Nothing above
//! this module inspects error messages.

use std::fmt;

use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// SQLSTATE codes for a server-side connection termination.
const TERMINATED_CONNECTION_CODES: [&str; 3] = ["57P01", "57P02", "57P03"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Terminated, refused or timed-out connection. Safe to retry.
    Connectivity,
    /// Unique, foreign-key, not-null or check violation.
    Constraint,
    NotFound,
    Other,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::Connectivity => "connectivity",
            StoreErrorKind::Constraint => "constraint",
            StoreErrorKind::NotFound => "not_found",
            StoreErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{kind} store error: {source}")]
pub struct StoreError {
    kind: StoreErrorKind,
    source: DbErr,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, source: DbErr) -> Self {
        Self { kind, source }
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        self.kind == StoreErrorKind::Connectivity
    }
}

impl From<DbErr> for StoreError {
    fn from(source: DbErr) -> Self {
        Self {
            kind: classify(&source),
            source,
        }
    }
}

pub fn classify(err: &DbErr) -> StoreErrorKind {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreErrorKind::Connectivity,
        DbErr::RecordNotFound(_) => StoreErrorKind::NotFound,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => match runtime {
            RuntimeErr::SqlxError(sqlx_err) => classify_sqlx(sqlx_err),
            _ => StoreErrorKind::Other,
        },
        _ => StoreErrorKind::Other,
    }
}

fn classify_sqlx(err: &sqlx::Error) -> StoreErrorKind {
    use sqlx::error::ErrorKind;

    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreErrorKind::Connectivity,
        sqlx::Error::RowNotFound => StoreErrorKind::NotFound,
        sqlx::Error::Database(db_err) => match db_err.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => StoreErrorKind::Constraint,
            _ => match db_err.code().as_deref() {
                // class 08: connection exception
                Some(code)
                    if code.starts_with("08") || TERMINATED_CONNECTION_CODES.contains(&code) =>
                {
                    StoreErrorKind::Connectivity
                }
                _ => StoreErrorKind::Other,
            },
        },
        _ => StoreErrorKind::Other,
    }
}
