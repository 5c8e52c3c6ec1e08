// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration
//!
//! Settings for the consent administration view and its consent store.
//! Loaded from TOML or built in code; [`ConsentAdminConfig::validate`]
//! must pass before anything is constructed from it.
//!
//! ```toml
//! secret_salt = "a long random installation secret"
//! userid_attribute = "eduPersonPrincipalName"
//! allow_bridge = true
//! back_url = "https://sp.example.org/"
//!
//! [store]
//! backend = "sqlite"
//! path = "/var/lib/consent/consent.db"
//! table = "consent"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{HashError, IdentifierHasher, InstallationSecret};
use crate::storage::StorageError;

/// Default attribute holding the user identifier.
pub const DEFAULT_USERID_ATTRIBUTE: &str = "eduPersonPrincipalName";

/// Default consent table name.
pub const DEFAULT_TABLE: &str = "consent";

/// Default SQLite busy timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid installation salt: {0}")]
    Salt(#[from] HashError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("consent store unreachable: {0}")]
    Unreachable(#[source] StorageError),
}

/// Consent store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file.
    #[default]
    Sqlite,
    /// Volatile in-process store.
    Memory,
}

/// Consent store descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file (SQLite only).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Consent table name.
    #[serde(default = "default_table")]
    pub table: String,

    /// How long SQLite waits on a locked database before reporting busy.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Sqlite,
            path: None,
            table: default_table(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// SQLite store at `path` with the default table.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            backend: StoreBackend::Sqlite,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Volatile in-memory store.
    pub fn memory() -> Self {
        StoreConfig {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    /// Checks the descriptor without touching the backend.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_table()?;

        if self.backend == StoreBackend::Sqlite {
            match &self.path {
                None => return Err(ConfigurationError::Missing("store.path")),
                Some(p) if p.as_os_str().is_empty() => {
                    return Err(ConfigurationError::Invalid {
                        field: "store.path",
                        reason: "must not be empty".into(),
                    })
                }
                Some(_) => {}
            }
        }

        if self.busy_timeout_ms == 0 {
            return Err(ConfigurationError::Invalid {
                field: "store.busy_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// The table name is interpolated into SQL, so only plain identifiers pass.
    /// SQLite reserves the `sqlite_` prefix for its own tables.
    pub(crate) fn validate_table(&self) -> Result<(), ConfigurationError> {
        let mut chars = self.table.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };

        if !valid {
            return Err(ConfigurationError::Invalid {
                field: "store.table",
                reason: format!("'{}' is not a plain SQL identifier", self.table),
            });
        }

        if self.table.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(ConfigurationError::Invalid {
                field: "store.table",
                reason: format!("'{}' uses the reserved sqlite_ prefix", self.table),
            });
        }
        Ok(())
    }
}

/// Settings of the consent administration view.
#[derive(Clone, Deserialize)]
pub struct ConsentAdminConfig {
    /// Installation secret mixed into every hashed user id.
    #[serde(default, deserialize_with = "deserialize_salt")]
    pub secret_salt: Option<Zeroizing<String>>,

    /// Attribute whose first value identifies the user.
    #[serde(default = "default_userid_attribute")]
    pub userid_attribute: String,

    /// Scope consent by the remote IdP when acting as a bridge.
    #[serde(default = "default_true")]
    pub allow_bridge: bool,

    /// Link back to the calling application.
    #[serde(default)]
    pub back_url: Option<String>,

    /// Include the source in hashed user ids.
    #[serde(default = "default_true")]
    pub scope_by_source: bool,

    /// Fingerprint attribute values as well as names.
    #[serde(default)]
    pub include_attribute_values: bool,

    /// Consent store descriptor.
    pub store: Option<StoreConfig>,
}

impl fmt::Debug for ConsentAdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentAdminConfig")
            .field("secret_salt", &self.secret_salt.as_ref().map(|_| "[REDACTED]"))
            .field("userid_attribute", &self.userid_attribute)
            .field("allow_bridge", &self.allow_bridge)
            .field("back_url", &self.back_url)
            .field("scope_by_source", &self.scope_by_source)
            .field("include_attribute_values", &self.include_attribute_values)
            .field("store", &self.store)
            .finish()
    }
}

fn deserialize_salt<'de, D>(deserializer: D) -> Result<Option<Zeroizing<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(Zeroizing::new))
}

fn default_userid_attribute() -> String {
    DEFAULT_USERID_ATTRIBUTE.to_string()
}

fn default_true() -> bool {
    true
}

impl ConsentAdminConfig {
    /// Creates a configuration with defaults for everything optional.
    pub fn new(secret_salt: impl Into<String>, store: StoreConfig) -> Self {
        ConsentAdminConfig {
            secret_salt: Some(Zeroizing::new(secret_salt.into())),
            userid_attribute: default_userid_attribute(),
            allow_bridge: true,
            back_url: None,
            scope_by_source: true,
            include_attribute_values: false,
            store: Some(store),
        }
    }

    /// Parses and validates TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        let config: ConsentAdminConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Checks every setting without touching the backend.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_identity()?;
        self.store_config()?.validate()
    }

    /// Checks the salt and user id settings, ignoring the store descriptor.
    pub fn validate_identity(&self) -> Result<(), ConfigurationError> {
        self.secret()?;

        if self.userid_attribute.trim().is_empty() {
            return Err(ConfigurationError::Invalid {
                field: "userid_attribute",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Returns the validated installation secret.
    pub fn secret(&self) -> Result<InstallationSecret, ConfigurationError> {
        let salt = self
            .secret_salt
            .as_deref()
            .ok_or(ConfigurationError::Missing("secret_salt"))?;
        Ok(InstallationSecret::new(salt)?)
    }

    /// Builds the identifier hasher for this installation.
    pub fn hasher(&self) -> Result<IdentifierHasher, ConfigurationError> {
        let secret = self.secret()?;
        Ok(IdentifierHasher::with_source_scoping(
            &secret,
            self.scope_by_source,
        ))
    }

    /// Returns the store descriptor.
    pub fn store_config(&self) -> Result<&StoreConfig, ConfigurationError> {
        self.store
            .as_ref()
            .ok_or(ConfigurationError::Missing("store"))
    }
}
