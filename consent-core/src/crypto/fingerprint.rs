// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Attribute set fingerprints.
//!
//! A consent grant covers one exact set of released attributes. The
//! fingerprint is a SHA-256 digest over a canonical encoding of that set,
//! so releasing an extra attribute later no longer matches the stored grant.

use std::fmt;

use ring::digest::{Context, SHA256};
use serde::Serialize;

use crate::identity::Attributes;

/// Opaque fingerprint of a consented attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AttributeFingerprint(String);

impl AttributeFingerprint {
    /// Computes the fingerprint of `attributes`.
    ///
    /// Names are always covered. Values only take part when
    /// `include_values` is set, in which case they are sorted first.
    pub fn of(attributes: &Attributes, include_values: bool) -> Self {
        let mut context = Context::new(&SHA256);
        context.update(&(attributes.len() as u64).to_be_bytes());

        for (name, values) in attributes {
            update_prefixed(&mut context, name.as_bytes());

            if include_values {
                let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                context.update(&(sorted.len() as u64).to_be_bytes());
                for value in sorted {
                    update_prefixed(&mut context, value.as_bytes());
                }
            }
        }

        let digest = context.finish();
        AttributeFingerprint(hex::encode(digest.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttributeFingerprint {
    fn from(s: &str) -> Self {
        AttributeFingerprint(s.to_string())
    }
}

impl From<String> for AttributeFingerprint {
    fn from(s: String) -> Self {
        AttributeFingerprint(s)
    }
}

impl fmt::Display for AttributeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn update_prefixed(context: &mut Context, data: &[u8]) {
    context.update(&(data.len() as u64).to_be_bytes());
    context.update(data);
}
