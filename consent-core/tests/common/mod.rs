// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared fixtures used across the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use consent_core::*;

pub const TEST_SALT: &str = "integration-test-salt-0123456789";

pub fn hasher() -> IdentifierHasher {
    IdentifierHasher::new(&InstallationSecret::new(TEST_SALT).unwrap())
}

pub fn user(name: &str) -> HashedUserId {
    hasher()
        .hash(name, "saml20-idp-hosted|https://idp.example.org")
        .unwrap()
}

pub fn memory_store() -> Arc<dyn ConsentStore> {
    Arc::new(MemoryConsentStore::new())
}

pub fn sqlite_store(path: &Path) -> Arc<dyn ConsentStore> {
    Arc::new(SqliteConsentStore::open_path(path).unwrap())
}

/// One instance of every backend, each on fresh storage.
pub fn all_stores(dir: &tempfile::TempDir) -> Vec<(&'static str, Arc<dyn ConsentStore>)> {
    vec![
        ("memory", memory_store()),
        ("sqlite", sqlite_store(&dir.path().join("consent.db"))),
    ]
}

pub fn attrs(pairs: &[(&str, &[&str])]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}
