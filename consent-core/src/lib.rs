// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Consent Core Library
//!
//! Stores which attribute sets a user agreed to release to which services,
//! keyed by a pseudonymous user identifier, and backs the simple consent
//! administration view where users review and withdraw those grants.
//! All cryptographic operations use the audited `ring` crate.

pub mod api;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod storage;

pub use api::{
    AdminRequest, AdminSummary, ConsentAdmin, ConsentAdminError, ConsentAdminResult,
    ConsentAdminService, ConsentOverview, ConsentReport,
};
pub use config::{ConfigurationError, ConsentAdminConfig, StoreBackend, StoreConfig};
pub use crypto::{
    AttributeFingerprint, HashError, HashedUserId, IdentifierHasher, InstallationSecret,
    HASHED_USER_ID_LEN,
};
pub use identity::{resolve_user_id, select_source, Attributes, IdpRef};
pub use storage::{
    open_store, ConsentRecord, ConsentStore, FailureKind, MemoryConsentStore, SqliteConsentStore,
    StorageError, StoreStatistics,
};
