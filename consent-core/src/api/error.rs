// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! API Error Types
//!
//! Unified error type for the consent administration layer.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::crypto::HashError;
use crate::storage::{FailureKind, StorageError};

/// Unified error type for consent administration.
#[derive(Error, Debug)]
pub enum ConsentAdminError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Consent store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid argument passed to the identifier hasher.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] HashError),

    /// The configured user id attribute was not released.
    #[error("missing user attribute: {0}")]
    MissingUserAttribute(String),
}

impl ConsentAdminError {
    /// Returns true if retrying the whole operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConsentAdminError::Storage(e) if e.kind() == FailureKind::Transient)
    }
}

/// Result type for consent administration.
pub type ConsentAdminResult<T> = Result<T, ConsentAdminError>;
