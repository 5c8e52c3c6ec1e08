// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Consent Storage Module
//!
//! Persists consent records keyed by hashed user identifier. Backends
//! implement [`ConsentStore`]; [`open_store`] picks one from a
//! [`StoreConfig`].
//!
//! A record is unique on `(hashed_user_id, service_id, attribute_fingerprint)`.
//! Records are never rewritten: a grant for a different attribute set is a
//! new record. Only the usage timestamp is refreshed in place.

mod error;
mod memory;
pub mod migration;
mod sqlite;

pub use error::{FailureKind, StorageError};
pub use memory::MemoryConsentStore;
pub use sqlite::SqliteConsentStore;

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigurationError, StoreBackend, StoreConfig};
use crate::crypto::{AttributeFingerprint, HashedUserId};

/// A stored consent grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentRecord {
    /// Pseudonymous user the grant belongs to.
    pub hashed_user_id: HashedUserId,
    /// Relying service the attributes are released to.
    pub service_id: String,
    /// Fingerprint of the released attribute set.
    pub attribute_fingerprint: AttributeFingerprint,
    /// When the grant was recorded (Unix seconds), if the backend tracks it.
    pub consent_date: Option<u64>,
    /// When the grant last matched a consent check (Unix seconds).
    pub usage_date: Option<u64>,
}

/// Aggregate figures over the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    /// Number of consent records.
    pub total: u64,
    /// Number of distinct hashed users.
    pub users: u64,
    /// Number of distinct services.
    pub services: u64,
}

/// Persistence contract for consent records.
///
/// Every method is a single atomic unit from the caller's point of view.
/// Implementations never retry internally; failures carry a
/// [`FailureKind`] so the caller can decide.
pub trait ConsentStore: Send + Sync {
    /// Checks for a grant matching the exact triple.
    ///
    /// A match refreshes the record's usage date.
    fn has_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<bool, StorageError>;

    /// Records a grant. Saving an existing triple again is a no-op.
    fn save_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<(), StorageError>;

    /// Lists all grants of one user in insertion order.
    fn list_consents(&self, user: &HashedUserId) -> Result<Vec<ConsentRecord>, StorageError>;

    /// Deletes every grant of one user for one service.
    ///
    /// Returns the number of records removed.
    fn delete_consent(&self, user: &HashedUserId, service_id: &str) -> Result<u64, StorageError>;

    /// Deletes every grant of one user atomically.
    ///
    /// Returns the number of records removed, 0 if there were none.
    fn delete_all_consents(&self, user: &HashedUserId) -> Result<u64, StorageError>;

    /// Returns aggregate figures over the whole store.
    fn statistics(&self) -> Result<StoreStatistics, StorageError>;

    /// Verifies that the backend is usable.
    fn self_test(&self) -> Result<(), StorageError>;
}

/// Opens the store described by `config`.
///
/// Fails with [`ConfigurationError`] if the descriptor is malformed or the
/// backend cannot be reached.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn ConsentStore>, ConfigurationError> {
    config.validate()?;

    debug!(backend = ?config.backend, table = %config.table, "opening consent store");

    let store: Box<dyn ConsentStore> = match config.backend {
        StoreBackend::Memory => Box::new(MemoryConsentStore::new()),
        StoreBackend::Sqlite => Box::new(SqliteConsentStore::open(config)?),
    };

    store.self_test().map_err(ConfigurationError::Unreachable)?;
    Ok(store)
}

/// Current Unix time in seconds.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
