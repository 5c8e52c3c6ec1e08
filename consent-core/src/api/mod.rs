// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Consent Administration API
//!
//! - [`admin`] - Query façade over a [`ConsentStore`](crate::storage::ConsentStore)
//! - [`service`] - Wires configuration, identifier hashing and the façade
//! - [`error`] - Error types for the API layer

pub mod admin;
pub mod error;
pub mod service;

pub use admin::{ConsentAdmin, ConsentOverview, ConsentReport};
pub use error::{ConsentAdminError, ConsentAdminResult};
pub use service::{AdminRequest, AdminSummary, ConsentAdminService};
