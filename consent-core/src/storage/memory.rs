// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory consent store.
//!
//! Does not survive restarts. Intended for tests and single-process
//! deployments without persistent consent.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{now_secs, ConsentRecord, ConsentStore, StorageError, StoreStatistics};
use crate::crypto::{AttributeFingerprint, HashedUserId};

/// In-memory storage for consent records indexed by hashed user.
pub struct MemoryConsentStore {
    /// Grants per user, in insertion order.
    records: RwLock<HashMap<HashedUserId, Vec<ConsentRecord>>>,
}

impl MemoryConsentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        MemoryConsentStore {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<HashedUserId, Vec<ConsentRecord>>>, StorageError> {
        self.records
            .read()
            .map_err(|_| StorageError::Poisoned("memory consent store".into()))
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<HashedUserId, Vec<ConsentRecord>>>, StorageError> {
        self.records
            .write()
            .map_err(|_| StorageError::Poisoned("memory consent store".into()))
    }
}

impl Default for MemoryConsentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentStore for MemoryConsentStore {
    fn has_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<bool, StorageError> {
        let mut records = self.write()?;
        let found = records.get_mut(user).and_then(|list| {
            list.iter_mut().find(|r| {
                r.service_id == service_id && &r.attribute_fingerprint == fingerprint
            })
        });

        match found {
            Some(record) => {
                record.usage_date = Some(now_secs());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn save_consent(
        &self,
        user: &HashedUserId,
        service_id: &str,
        fingerprint: &AttributeFingerprint,
    ) -> Result<(), StorageError> {
        let mut records = self.write()?;
        let list = records.entry(user.clone()).or_default();

        let exists = list
            .iter()
            .any(|r| r.service_id == service_id && &r.attribute_fingerprint == fingerprint);
        if !exists {
            list.push(ConsentRecord {
                hashed_user_id: user.clone(),
                service_id: service_id.to_string(),
                attribute_fingerprint: fingerprint.clone(),
                consent_date: Some(now_secs()),
                usage_date: None,
            });
        }
        Ok(())
    }

    fn list_consents(&self, user: &HashedUserId) -> Result<Vec<ConsentRecord>, StorageError> {
        let records = self.read()?;
        Ok(records.get(user).cloned().unwrap_or_default())
    }

    fn delete_consent(&self, user: &HashedUserId, service_id: &str) -> Result<u64, StorageError> {
        let mut records = self.write()?;
        let Some(list) = records.get_mut(user) else {
            return Ok(0);
        };

        let initial_len = list.len();
        list.retain(|r| r.service_id != service_id);
        let removed = (initial_len - list.len()) as u64;

        // Clean up empty entries
        if list.is_empty() {
            records.remove(user);
        }
        Ok(removed)
    }

    fn delete_all_consents(&self, user: &HashedUserId) -> Result<u64, StorageError> {
        let mut records = self.write()?;
        Ok(records
            .remove(user)
            .map(|list| list.len() as u64)
            .unwrap_or(0))
    }

    fn statistics(&self) -> Result<StoreStatistics, StorageError> {
        let records = self.read()?;
        let services: HashSet<&str> = records
            .values()
            .flatten()
            .map(|r| r.service_id.as_str())
            .collect();

        Ok(StoreStatistics {
            total: records.values().map(|l| l.len() as u64).sum(),
            users: records.len() as u64,
            services: services.len() as u64,
        })
    }

    fn self_test(&self) -> Result<(), StorageError> {
        self.read().map(|_| ())
    }
}
