// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Consent Administration Service
//!
//! Wires configuration, identifier hashing and the query façade together.
//! Authentication happens before any of this runs: callers hand over the
//! attributes of an already authenticated user plus the provider consent
//! is scoped to (see [`select_source`](crate::identity::select_source)).

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::admin::{ConsentAdmin, ConsentOverview};
use super::error::{ConsentAdminError, ConsentAdminResult};
use crate::config::{ConfigurationError, ConsentAdminConfig};
use crate::crypto::{AttributeFingerprint, HashedUserId, IdentifierHasher};
use crate::identity::{resolve_user_id, select_source, Attributes, IdpRef};
use crate::storage::{open_store, ConsentRecord, ConsentStore};

/// One request to the administration view.
#[derive(Debug, Clone)]
pub struct AdminRequest<'a> {
    /// Attributes of the authenticated user.
    pub attributes: &'a Attributes,
    /// Provider consent is scoped to.
    pub idp: IdpRef,
    /// Whether the user asked to withdraw all consents.
    pub withdraw_requested: bool,
}

/// Everything the presentation layer needs to render the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    /// The raw user identifier, shown back to the user.
    pub user_id: String,
    /// Number of distinct services with at least one grant.
    pub service_count: usize,
    /// Number of consent records.
    pub consent_count: usize,
    /// Records removed by a withdraw, `None` if none was requested.
    pub removed: Option<u64>,
    /// Link back to the calling application.
    pub back_url: Option<String>,
    /// Remaining records.
    pub records: Vec<ConsentRecord>,
}

/// Consent administration for one installation.
pub struct ConsentAdminService {
    config: ConsentAdminConfig,
    hasher: IdentifierHasher,
    admin: ConsentAdmin,
}

impl ConsentAdminService {
    /// Validates `config` and opens the configured store.
    pub fn from_config(config: ConsentAdminConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let store: Arc<dyn ConsentStore> = Arc::from(open_store(config.store_config()?)?);
        Self::assemble(config, store)
    }

    /// Uses an already opened store. Any `[store]` descriptor in `config`
    /// is ignored.
    pub fn with_store(
        config: ConsentAdminConfig,
        store: Arc<dyn ConsentStore>,
    ) -> Result<Self, ConfigurationError> {
        config.validate_identity()?;
        Self::assemble(config, store)
    }

    fn assemble(
        mut config: ConsentAdminConfig,
        store: Arc<dyn ConsentStore>,
    ) -> Result<Self, ConfigurationError> {
        let hasher = config.hasher()?;
        // The hasher holds the key from here on; drop (and wipe) the salt.
        config.secret_salt = None;

        Ok(ConsentAdminService {
            config,
            hasher,
            admin: ConsentAdmin::new(store),
        })
    }

    /// Returns the settings in effect, without the installation salt.
    pub fn config(&self) -> &ConsentAdminConfig {
        &self.config
    }

    /// Returns the query façade.
    pub fn admin(&self) -> &ConsentAdmin {
        &self.admin
    }

    /// Picks the provider to scope consent to, honouring `allow_bridge`.
    pub fn select_source(&self, remote: Option<IdpRef>, hosted: IdpRef) -> IdpRef {
        select_source(self.config.allow_bridge, remote, hosted)
    }

    /// Resolves the raw user id from `attributes` and derives its hash.
    pub fn identify(
        &self,
        attributes: &Attributes,
        idp: &IdpRef,
    ) -> ConsentAdminResult<(String, HashedUserId)> {
        let attribute = &self.config.userid_attribute;
        let user_id = resolve_user_id(attributes, attribute).ok_or_else(|| {
            warn!(attribute = %attribute, "user id attribute missing from user's attributes");
            ConsentAdminError::MissingUserAttribute(attribute.clone())
        })?;

        let source = idp.source();
        debug!(source = %source, "deriving hashed user id");
        let hashed = self.hasher.hash(user_id, &source)?;

        Ok((user_id.to_string(), hashed))
    }

    /// Serves one visit to the administration view.
    pub fn handle(&self, request: &AdminRequest<'_>) -> ConsentAdminResult<AdminSummary> {
        let (user_id, hashed) = self.identify(request.attributes, &request.idp)?;
        let report = self.admin.process(&hashed, request.withdraw_requested)?;
        let ConsentOverview {
            service_count,
            consent_count,
            records,
        } = report.overview;

        Ok(AdminSummary {
            user_id,
            service_count,
            consent_count,
            removed: report.removed,
            back_url: self.config.back_url.clone(),
            records,
        })
    }

    /// Fingerprints `released` according to the configuration.
    pub fn fingerprint(&self, released: &Attributes) -> AttributeFingerprint {
        AttributeFingerprint::of(released, self.config.include_attribute_values)
    }

    /// Records that the user agreed to release `released` to `service_id`.
    pub fn grant(
        &self,
        user: &HashedUserId,
        service_id: &str,
        released: &Attributes,
    ) -> ConsentAdminResult<AttributeFingerprint> {
        let fingerprint = self.fingerprint(released);
        self.admin
            .store()
            .save_consent(user, service_id, &fingerprint)?;
        Ok(fingerprint)
    }

    /// Checks for a grant covering exactly `released` for `service_id`.
    pub fn is_granted(
        &self,
        user: &HashedUserId,
        service_id: &str,
        released: &Attributes,
    ) -> ConsentAdminResult<bool> {
        let fingerprint = self.fingerprint(released);
        Ok(self
            .admin
            .store()
            .has_consent(user, service_id, &fingerprint)?)
    }
}
