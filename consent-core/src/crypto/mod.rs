// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod fingerprint;
pub mod hasher;

pub use fingerprint::AttributeFingerprint;
pub use hasher::{
    HashError, HashedUserId, IdentifierHasher, InstallationSecret, HASHED_USER_ID_LEN,
    MIN_SALT_LEN,
};
