// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pseudonymous User Identifiers
//!
//! Derives the key under which consent records are stored. Raw user
//! identifiers never reach the consent store; instead they are passed
//! through HMAC-SHA-256 keyed with an installation-held salt.
//!
//! Message layout (all lengths are big-endian u64):
//!
//! `DOMAIN_TAG || len(user_id) || user_id [|| len(source) || source]`
//!
//! The source part is only present when the hasher scopes by source.
//! Length prefixes keep `("a|b", "c")` and `("a", "b|c")` apart.

use std::fmt;

use ring::hmac;
use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain separation tag mixed into every identifier.
const DOMAIN_TAG: &[u8] = b"consent-core/hashed-user-id/v1";

/// Minimum accepted salt length in bytes.
pub const MIN_SALT_LEN: usize = 16;

/// Salt value shipped in sample SAML configurations.
const PLACEHOLDER_SALT: &str = "defaultsecretsalt";

/// Length of a hex-encoded identifier (SHA-256 output).
pub const HASHED_USER_ID_LEN: usize = 64;

/// Hashing error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("user identifier must not be empty")]
    EmptyUserId,

    #[error("installation salt is empty")]
    EmptySalt,

    #[error("installation salt must be at least {min} bytes", min = MIN_SALT_LEN)]
    SaltTooShort,

    #[error("installation salt is still the placeholder value")]
    PlaceholderSalt,
}

/// Installation-wide secret salt.
///
/// Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct InstallationSecret {
    bytes: Vec<u8>,
}

impl fmt::Debug for InstallationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for InstallationSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl InstallationSecret {
    /// Validates and wraps a salt string.
    pub fn new(salt: &str) -> Result<Self, HashError> {
        if salt.is_empty() {
            return Err(HashError::EmptySalt);
        }
        if salt == PLACEHOLDER_SALT {
            return Err(HashError::PlaceholderSalt);
        }
        if salt.len() < MIN_SALT_LEN {
            return Err(HashError::SaltTooShort);
        }
        Ok(InstallationSecret {
            bytes: salt.as_bytes().to_vec(),
        })
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A hex-encoded, fixed-length pseudonymous user identifier.
///
/// Only [`IdentifierHasher::hash`] produces one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HashedUserId(String);

impl HashedUserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives [`HashedUserId`]s from raw identifiers and sources.
pub struct IdentifierHasher {
    key: hmac::Key,
    scope_by_source: bool,
}

impl fmt::Debug for IdentifierHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierHasher")
            .field("key", &"[REDACTED]")
            .field("scope_by_source", &self.scope_by_source)
            .finish()
    }
}

impl IdentifierHasher {
    /// Creates a hasher that scopes identifiers by source.
    pub fn new(secret: &InstallationSecret) -> Self {
        Self::with_source_scoping(secret, true)
    }

    /// Creates a hasher, choosing whether the source takes part in the hash.
    ///
    /// With scoping disabled the same person gets one identifier across all
    /// identity providers of this installation.
    pub fn with_source_scoping(secret: &InstallationSecret, scope_by_source: bool) -> Self {
        IdentifierHasher {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            scope_by_source,
        }
    }

    /// Returns whether the source is part of the derived identifier.
    pub fn scopes_by_source(&self) -> bool {
        self.scope_by_source
    }

    /// Derives the hashed identifier for `raw_user_id` under `source`.
    ///
    /// `source` is treated as an opaque string.
    pub fn hash(&self, raw_user_id: &str, source: &str) -> Result<HashedUserId, HashError> {
        if raw_user_id.is_empty() {
            return Err(HashError::EmptyUserId);
        }

        let mut ctx = hmac::Context::with_key(&self.key);
        ctx.update(DOMAIN_TAG);
        update_prefixed(&mut ctx, raw_user_id.as_bytes());
        if self.scope_by_source {
            update_prefixed(&mut ctx, source.as_bytes());
        }
        let tag = ctx.sign();

        Ok(HashedUserId(hex::encode(tag.as_ref())))
    }
}

fn update_prefixed(ctx: &mut hmac::Context, data: &[u8]) {
    ctx.update(&(data.len() as u64).to_be_bytes());
    ctx.update(data);
}
