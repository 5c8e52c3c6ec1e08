//! Storage error types.

use std::time::Duration;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Whether a failed operation may succeed when retried by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection drop, timeout or lock contention.
    Transient,
    /// Misconfiguration, schema mismatch or corrupt data.
    Permanent,
}

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {source}")]
    Database {
        kind: FailureKind,
        #[source]
        source: rusqlite::Error,
    },

    /// A deadline enforced by the caller expired.
    ///
    /// Backends never raise this themselves; SQLite lock waits surface as
    /// a transient [`StorageError::Database`]. Callers running a store
    /// operation under their own deadline report expiry with this variant
    /// so it classifies as [`FailureKind::Transient`].
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Classifies the error for the caller's retry decision.
    pub fn kind(&self) -> FailureKind {
        match self {
            StorageError::Database { kind, .. } => *kind,
            StorageError::Timeout(_) => FailureKind::Transient,
            StorageError::Poisoned(_) | StorageError::Migration(_) => FailureKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == FailureKind::Transient
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(source: rusqlite::Error) -> Self {
        let kind = match source.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked)
            | Some(ErrorCode::SystemIoFailure) => FailureKind::Transient,
            _ => FailureKind::Permanent,
        };
        StorageError::Database { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_and_locked_are_transient() {
        let busy = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        let locked = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED));
        assert!(busy.is_transient());
        assert!(locked.is_transient());
    }

    #[test]
    fn test_constraint_is_permanent() {
        let err = StorageError::from(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT));
        assert_eq!(err.kind(), FailureKind::Permanent);
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(StorageError::Timeout(Duration::from_millis(250)).is_transient());
    }

    #[test]
    fn test_migration_is_permanent() {
        assert!(!StorageError::Migration("v1 failed".into()).is_transient());
    }
}
