// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Identity inputs.
//!
//! Helpers for turning what the authentication layer hands over into the
//! two strings the identifier hasher needs: the raw user id and the source.

use std::collections::BTreeMap;
use std::fmt;

/// Released attributes, by name. Values keep the order they arrived in.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// Returns the first value of `attribute_name`, if present and non-empty.
pub fn resolve_user_id<'a>(attributes: &'a Attributes, attribute_name: &str) -> Option<&'a str> {
    attributes
        .get(attribute_name)
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// An identity provider as seen from one metadata set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpRef {
    /// Metadata set the provider was found in, e.g. `saml20-idp-remote`.
    pub metadata_set: String,
    /// SAML entity identifier.
    pub entity_id: String,
}

impl IdpRef {
    pub fn new(metadata_set: impl Into<String>, entity_id: impl Into<String>) -> Self {
        IdpRef {
            metadata_set: metadata_set.into(),
            entity_id: entity_id.into(),
        }
    }

    /// Remote provider, used when this installation acts as a bridge.
    pub fn remote(entity_id: impl Into<String>) -> Self {
        Self::new("saml20-idp-remote", entity_id)
    }

    /// Provider hosted by this installation.
    pub fn hosted(entity_id: impl Into<String>) -> Self {
        Self::new("saml20-idp-hosted", entity_id)
    }

    /// Consent scoping source: `<metadata-set>|<entity-id>`.
    pub fn source(&self) -> String {
        format!("{}|{}", self.metadata_set, self.entity_id)
    }
}

impl fmt::Display for IdpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.metadata_set, self.entity_id)
    }
}

/// Chooses the provider consent is scoped to.
///
/// When bridging is allowed and the user came through a remote provider,
/// that provider wins; otherwise the locally hosted one is used.
pub fn select_source(allow_bridge: bool, remote: Option<IdpRef>, hosted: IdpRef) -> IdpRef {
    match remote {
        Some(remote) if allow_bridge => remote,
        _ => hosted,
    }
}
