// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Consent Query Façade
//!
//! What a presentation layer calls to show a user their consents and to
//! withdraw all of them. Errors from the store are passed through as-is.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::crypto::HashedUserId;
use crate::storage::{ConsentRecord, ConsentStore, StorageError};

/// A user's consents with aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsentOverview {
    /// Number of distinct services with at least one grant.
    pub service_count: usize,
    /// Number of consent records.
    pub consent_count: usize,
    /// The records, in store order.
    pub records: Vec<ConsentRecord>,
}

impl ConsentOverview {
    /// Aggregates a record list.
    pub fn from_records(records: Vec<ConsentRecord>) -> Self {
        let service_count = records
            .iter()
            .map(|r| r.service_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        ConsentOverview {
            service_count,
            consent_count: records.len(),
            records,
        }
    }
}

/// Outcome of one visit to the administration view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentReport {
    /// Records removed by a withdraw, `None` if none was requested.
    pub removed: Option<u64>,
    /// Consents remaining after the optional withdraw.
    pub overview: ConsentOverview,
}

/// Stateless façade over a consent store.
#[derive(Clone)]
pub struct ConsentAdmin {
    store: Arc<dyn ConsentStore>,
}

impl ConsentAdmin {
    /// Creates a façade over `store`.
    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        ConsentAdmin { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn ConsentStore> {
        &self.store
    }

    /// Lists a user's consents with service and consent counts.
    pub fn view_consents(&self, user: &HashedUserId) -> Result<ConsentOverview, StorageError> {
        let records = self.store.list_consents(user)?;
        let overview = ConsentOverview::from_records(records);

        debug!(
            consents = overview.consent_count,
            services = overview.service_count,
            "listed consents"
        );
        Ok(overview)
    }

    /// Deletes every consent of a user. Cannot be undone.
    ///
    /// Returns the number of records removed.
    pub fn withdraw_all(&self, user: &HashedUserId) -> Result<u64, StorageError> {
        info!(user = %user, "user has requested to withdraw all consents");
        let removed = self.store.delete_all_consents(user)?;
        debug!(user = %user, removed, "withdrew consents");
        Ok(removed)
    }

    /// Withdraws all consents first if requested, then lists what remains.
    pub fn process(
        &self,
        user: &HashedUserId,
        withdraw_requested: bool,
    ) -> Result<ConsentReport, StorageError> {
        let removed = if withdraw_requested {
            Some(self.withdraw_all(user)?)
        } else {
            None
        };

        Ok(ConsentReport {
            removed,
            overview: self.view_consents(user)?,
        })
    }
}
