// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite-backed consent store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use tracing::debug;

use super::migration::{all_migrations, quoted, MigrationRunner};
use super::{now_secs, ConsentRecord, ConsentStore, StorageError, StoreStatistics};
use crate::config::{ConfigurationError, StoreConfig};
use crate::crypto::{AttributeFingerprint, HashedUserId};

/// Consent store backed by one SQLite table.
///
/// All operations go through a single connection, so a reader never
/// observes a delete-all half applied.
pub struct SqliteConsentStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteConsentStore {
    /// Opens (or creates) the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, ConfigurationError> {
        let path = config
            .path
            .as_deref()
            .ok_or(ConfigurationError::Missing("store.path"))?;

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ConfigurationError::Unreachable(e.into()))?;

        Self::from_connection(conn, config)
    }

    /// Creates a store on a private in-memory database (for testing).
    pub fn in_memory(config: &StoreConfig) -> Result<Self, ConfigurationError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ConfigurationError::Unreachable(e.into()))?;
        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &StoreConfig) -> Result<Self, ConfigurationError> {
        config.validate_table()?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| ConfigurationError::Unreachable(e.into()))?;
        MigrationRunner::run(&conn, &config.table, &all_migrations())
            .map_err(ConfigurationError::Unreachable)?;

        debug!(table = %config.table, "sqlite consent store ready");

        Ok(SqliteConsentStore {
            conn: Mutex::new(conn),
            table: config.table.clone(),
        })
    }

    /// Opens the database at `path` with default table settings.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let config = StoreConfig::sqlite(path.as_ref());
        Self::open(&config)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        let conn = self.lock()?;
        MigrationRunner::current_version(&conn, &self.table)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Poisoned("sqlite connection".into()))
    }
}

impl ConsentStore for SqliteConsentStore {
    fn has_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let touched = conn.execute(
            &format!(
                "UPDATE {} SET usage_date = ?4
                 WHERE hashed_user_id = ?1 AND service_id = ?2 AND attribute = ?3",
                quoted(&self.table)
            ),
            params![
                user.as_str(),
                service_id,
                fingerprint.as_str(),
                now_secs() as i64
            ],
        )?;
        Ok(touched > 0)
    }

    fn save_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (hashed_user_id, service_id, attribute, consent_date)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (hashed_user_id, service_id, attribute) DO NOTHING",
                quoted(&self.table)
            ),
            params![
                user.as_str(),
                service_id,
                fingerprint.as_str(),
                now_secs() as i64
            ],
        )?;
        Ok(())
    }

    fn list_consents(&self, user: &HashedUserId) -> Result<Vec<ConsentRecord>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT service_id, attribute, consent_date, usage_date
             FROM {} WHERE hashed_user_id = ?1 ORDER BY rowid",
            quoted(&self.table)
        ))?;

        let records = stmt
            .query_map(params![user.as_str()], |row| {
                Ok(ConsentRecord {
                    hashed_user_id: user.clone(),
                    service_id: row.get(0)?,
                    attribute_fingerprint: row.get::<_, String>(1)?.into(),
                    consent_date: row.get::<_, Option<i64>>(2)?.map(|ts| ts as u64),
                    usage_date: row.get::<_, Option<i64>>(3)?.map(|ts| ts as u64),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn delete_consent(&self, user: &HashedUserId, service_id: &str) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE hashed_user_id = ?1 AND service_id = ?2",
                quoted(&self.table)
            ),
            params![user.as_str(), service_id],
        )?;
        Ok(removed as u64)
    }

    fn delete_all_consents(&self, user: &HashedUserId) -> Result<u64, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE hashed_user_id = ?1",
                quoted(&self.table)
            ),
            params![user.as_str()],
        )?;
        tx.commit()?;
        Ok(removed as u64)
    }

    fn statistics(&self) -> Result<StoreStatistics, StorageError> {
        let conn = self.lock()?;
        let (total, users, services) = conn.query_row(
            &format!(
                "SELECT COUNT(*), COUNT(DISTINCT hashed_user_id), COUNT(DISTINCT service_id)
                 FROM {}",
                quoted(&self.table)
            ),
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;

        Ok(StoreStatistics {
            total: total as u64,
            users: users as u64,
            services: services as u64,
        })
    }

    fn self_test(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quoted(&self.table)),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{IdentifierHasher, InstallationSecret};

    fn user(name: &str) -> HashedUserId {
        let secret = InstallationSecret::new("sqlite-store-test-salt").unwrap();
        IdentifierHasher::new(&secret).hash(name, "src").unwrap()
    }

    fn test_store() -> SqliteConsentStore {
        SqliteConsentStore::in_memory(&StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(test_store().schema_version().unwrap(), 2);
    }

    #[test]
    fn test_has_consent_sets_usage_date() {
        let store = test_store();
        let alice = user("alice");
        store.save_consent(&alice, "sp1", &"fp1".into()).unwrap();
        assert_eq!(store.list_consents(&alice).unwrap()[0].usage_date, None);

        assert!(store.has_consent(&alice, "sp1", &"fp1".into()).unwrap());
        assert!(store.list_consents(&alice).unwrap()[0].usage_date.is_some());
    }

    #[test]
    fn test_rows_of_other_users_are_not_listed() {
        let store = test_store();
        store.save_consent(&user("alice"), "sp1", &"fp1".into()).unwrap();
        store.save_consent(&user("bob"), "sp1", &"fp1".into()).unwrap();

        let listed = store.list_consents(&user("alice")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].hashed_user_id, user("alice"));
    }

    #[test]
    fn test_missing_directory_is_unreachable() {
        let config = StoreConfig::sqlite("/nonexistent-dir/for/consent/test.db");
        assert!(matches!(
            SqliteConsentStore::open(&config),
            Err(ConfigurationError::Unreachable(_))
        ));
    }

    #[test]
    fn test_keyword_table_name() {
        let mut config = StoreConfig::default();
        config.table = "order".to_string();
        let store = SqliteConsentStore::in_memory(&config).unwrap();
        store.save_consent(&user("alice"), "sp1", &"fp1".into()).unwrap();
        assert!(store.has_consent(&user("alice"), "sp1", &"fp1".into()).unwrap());
        assert_eq!(store.delete_all_consents(&user("alice")).unwrap(), 1);
    }

    #[test]
    fn test_custom_table_name() {
        let mut config = StoreConfig::default();
        config.table = "consent_v2".to_string();
        let store = SqliteConsentStore::in_memory(&config).unwrap();
        store.save_consent(&user("alice"), "sp1", &"fp1".into()).unwrap();
        assert_eq!(store.statistics().unwrap().total, 1);
    }
}
