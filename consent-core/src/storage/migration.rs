// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Provides versioned schema migrations with transactional safety.
//! Migration SQL is written against a `{table}` placeholder so that one
//! database can host several consent tables. Applied versions are tracked
//! per consent table in `{table}_schema_version`, and pending migrations
//! run in order within a single transaction.

use rusqlite::Connection;
use tracing::debug;

use super::{now_secs, StorageError};

/// Placeholder substituted with the consent table name.
const TABLE_PLACEHOLDER: &str = "{table}";

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// SQL with `{table}` placeholders.
    pub sql: &'static str,
}

impl Migration {
    fn render(&self, table: &str) -> String {
        self.sql.replace(TABLE_PLACEHOLDER, table)
    }
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations for `table` in a transaction.
    ///
    /// The exclusive lock is taken before the version table is created and
    /// read, so connections opening the same new database apply each
    /// migration exactly once. If any migration fails, all changes are
    /// rolled back.
    pub fn run(conn: &Connection, table: &str, migrations: &[Migration]) -> Result<(), StorageError> {
        for window in migrations.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        match Self::apply_pending(conn, table, migrations) {
            Ok(()) => {
                conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(e) => {
                conn.execute_batch("ROLLBACK;")?;
                Err(e)
            }
        }
    }

    fn apply_pending(
        conn: &Connection,
        table: &str,
        migrations: &[Migration],
    ) -> Result<(), StorageError> {
        let version_table = quoted(&version_table(table));

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {version_table} (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );"
        ))?;

        let current_version = Self::current_version(conn, table)?;

        for migration in migrations.iter().filter(|m| m.version > current_version) {
            debug!(
                table,
                version = migration.version,
                name = migration.name,
                "applying consent schema migration"
            );

            conn.execute_batch(&migration.render(table)).map_err(|e| {
                StorageError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                ))
            })?;

            conn.execute(
                &format!("INSERT INTO {version_table} (version, applied_at) VALUES (?1, ?2)"),
                rusqlite::params![migration.version, now_secs() as i64],
            )
            .map_err(|e| {
                StorageError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                ))
            })?;
        }

        Ok(())
    }

    /// Returns the current schema version of `table`, or 0 if none applied.
    pub fn current_version(conn: &Connection, table: &str) -> Result<u32, StorageError> {
        let version_table = version_table(table);
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
            [&version_table],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = conn.query_row(
            &format!("SELECT MAX(version) FROM {}", quoted(&version_table)),
            [],
            |row| row.get(0),
        )?;

        Ok(version.unwrap_or(0))
    }
}

fn version_table(table: &str) -> String {
    format!("{table}_schema_version")
}

/// Quotes a validated identifier so SQL keywords work as table names.
pub(crate) fn quoted(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

/// Returns all registered migrations in version order.
///
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "baseline_consent_table",
            sql: MIGRATION_V1_BASELINE,
        },
        Migration {
            version: 2,
            name: "service_index",
            sql: MIGRATION_V2_SERVICE_INDEX,
        },
    ]
}

/// Migration v1: consent table.
///
/// `attribute` holds the attribute set fingerprint.
const MIGRATION_V1_BASELINE: &str = r#"
    CREATE TABLE IF NOT EXISTS "{table}" (
        hashed_user_id TEXT NOT NULL,
        service_id TEXT NOT NULL,
        attribute TEXT NOT NULL,
        consent_date INTEGER NOT NULL,
        usage_date INTEGER,
        UNIQUE (hashed_user_id, service_id, attribute)
    );
"#;

/// Migration v2: index for per-service statistics and deletes.
const MIGRATION_V2_SERVICE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS "idx_{table}_service" ON "{table}"(service_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, "consent", &all_migrations()).unwrap();
        assert_eq!(MigrationRunner::current_version(&conn, "consent").unwrap(), 2);
    }

    #[test]
    fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, "consent", &all_migrations()).unwrap();
        MigrationRunner::run(&conn, "consent", &all_migrations()).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM consent_schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_tables_are_versioned_independently() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, "consent", &all_migrations()).unwrap();
        assert_eq!(MigrationRunner::current_version(&conn, "other").unwrap(), 0);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let broken = vec![
            Migration {
                version: 1,
                name: "ok",
                sql: "CREATE TABLE {table} (x INTEGER);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "THIS IS NOT SQL;",
            },
        ];

        let err = MigrationRunner::run(&conn, "consent", &broken).unwrap_err();
        assert!(matches!(err, StorageError::Migration(_)));
        assert_eq!(MigrationRunner::current_version(&conn, "consent").unwrap(), 0);

        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='consent'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_keyword_table_name() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, "order", &all_migrations()).unwrap();
        assert_eq!(MigrationRunner::current_version(&conn, "order").unwrap(), 2);
    }

    #[test]
    fn test_out_of_order_migrations_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let unordered = vec![
            Migration {
                version: 2,
                name: "second",
                sql: "",
            },
            Migration {
                version: 1,
                name: "first",
                sql: "",
            },
        ];
        assert!(matches!(
            MigrationRunner::run(&conn, "consent", &unordered),
            Err(StorageError::Migration(_))
        ));
    }
}
