//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! The schema itself never raises anything: SQLite enforces uniqueness,
//! non-null and foreign-key rules at write time. Those engine failures are
//! classified here so callers can tell "you sent a duplicate" apart from "the
//! database is broken".

use derive_more::{Display, Error};
use exn::ResultExt;
use sqlx::error::ErrorKind as SqlxErrorKind;

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A value that must be unique (username, email, isbn, tag name, plugin
    /// name, book/tag pair) is already taken.
    #[display("uniqueness constraint violated: {_0}")]
    UniqueViolation(#[error(not(source))] String),
    /// A referenced row (user, book, author, tag) does not exist.
    #[display("foreign key constraint violated: {_0}")]
    ForeignKeyViolation(#[error(not(source))] String),
    /// A mandatory column was left empty.
    #[display("not-null constraint violated: {_0}")]
    NotNullViolation(#[error(not(source))] String),
    #[display("{_0} not found: ({_1})")]
    NotFound(#[error(not(source))] &'static str, #[error(not(source))] i64),
    /// Stored data could not be mapped onto its model.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Classify a driver error by the constraint it tripped, if any.
    pub(crate) fn from_sqlx(err: &sqlx::Error) -> Self {
        let Some(db_err) = err.as_database_error() else {
            return Self::Database;
        };
        let message = db_err.message().to_string();
        match db_err.kind() {
            SqlxErrorKind::UniqueViolation => Self::UniqueViolation(message),
            SqlxErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(message),
            SqlxErrorKind::NotNullViolation => Self::NotNullViolation(message),
            _ => Self::Database,
        }
    }

    /// Returns `true` if retrying might succeed.
    ///
    /// Constraint violations and missing rows fail the same way every time;
    /// a generic database error may have been a lock that outlived the busy
    /// timeout.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }

    /// Returns `true` if the write was rejected by an integrity rule of the
    /// schema rather than by a fault in the database itself.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation(_) | Self::ForeignKeyViolation(_) | Self::NotNullViolation(_)
        )
    }
}

/// Raise driver errors as classified catalog errors.
pub(crate) trait QueryResultExt<T> {
    fn or_raise_query(self) -> Result<T>;
}
impl<T> QueryResultExt<T> for std::result::Result<T, sqlx::Error> {
    #[track_caller]
    fn or_raise_query(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = ErrorKind::from_sqlx(&err);
                Err(err).or_raise(|| kind)
            },
        }
    }
}
