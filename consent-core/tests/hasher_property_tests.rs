// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property tests for identifier hashing and attribute fingerprints.

mod common;

use common::hasher;
use consent_core::*;
use proptest::prelude::*;

fn user_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._%+|-]{1,32}(@[a-z0-9.-]{1,16})?"
}

fn source() -> impl Strategy<Value = String> {
    "(saml20-idp-remote|saml20-idp-hosted)\\|https://[a-z]{1,12}\\.example\\.org"
}

proptest! {
    #[test]
    fn prop_hash_is_deterministic(id in user_id(), src in source()) {
        let h = hasher();
        prop_assert_eq!(h.hash(&id, &src).unwrap(), h.hash(&id, &src).unwrap());
    }

    #[test]
    fn prop_hash_is_fixed_length_hex(id in user_id(), src in source()) {
        let hashed = hasher().hash(&id, &src).unwrap();
        prop_assert_eq!(hashed.as_str().len(), HASHED_USER_ID_LEN);
        prop_assert!(hashed
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn prop_hash_separates_sources(id in user_id(), a in source(), b in source()) {
        prop_assume!(a != b);
        let h = hasher();
        prop_assert_ne!(h.hash(&id, &a).unwrap(), h.hash(&id, &b).unwrap());
    }

    #[test]
    fn prop_hash_never_contains_raw_id(id in "[a-z]{8,32}", src in source()) {
        let hashed = hasher().hash(&id, &src).unwrap();
        prop_assert!(!hashed.as_str().contains(&id));
    }

    #[test]
    fn prop_fingerprint_ignores_value_order(
        values in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let mut reversed = values.clone();
        reversed.reverse();

        let mut a = Attributes::new();
        a.insert("mail".into(), values);
        let mut b = Attributes::new();
        b.insert("mail".into(), reversed);

        prop_assert_eq!(
            AttributeFingerprint::of(&a, true),
            AttributeFingerprint::of(&b, true)
        );
    }
}

#[test]
fn test_hash_is_stable_across_hasher_instances() {
    let a = hasher().hash("alice@example.org", "src").unwrap();
    let b = hasher().hash("alice@example.org", "src").unwrap();
    assert_eq!(a, b);
}
