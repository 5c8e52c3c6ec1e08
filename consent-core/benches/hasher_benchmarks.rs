// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Performance Benchmarks for Hashing and Storage Operations
//!
//! Run with: cargo bench -p consent-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};

// =============================================================================
// IDENTIFIER HASHING BENCHMARKS
// =============================================================================

fn bench_identifier_hashing(c: &mut Criterion) {
    use consent_core::crypto::{IdentifierHasher, InstallationSecret};

    let secret = InstallationSecret::new("benchmark-installation-salt").unwrap();
    let hasher = IdentifierHasher::new(&secret);
    let source = "saml20-idp-remote|https://idp.example.org";

    let mut group = c.benchmark_group("identifier_hashing");
    group.bench_function("hash_user_id", |b| {
        b.iter(|| hasher.hash(black_box("alice@example.org"), black_box(source)))
    });
    group.finish();
}

// =============================================================================
// ATTRIBUTE FINGERPRINT BENCHMARKS
// =============================================================================

fn bench_fingerprint(c: &mut Criterion) {
    use consent_core::crypto::AttributeFingerprint;
    use consent_core::identity::Attributes;

    let mut attributes = Attributes::new();
    for i in 0..20 {
        attributes.insert(
            format!("urn:oid:1.3.6.1.4.1.5923.1.1.1.{}", i),
            vec![format!("value-{}", i), format!("other-{}", i)],
        );
    }

    let mut group = c.benchmark_group("attribute_fingerprint");
    group.bench_function("names_only_20", |b| {
        b.iter(|| AttributeFingerprint::of(black_box(&attributes), false))
    });
    group.bench_function("with_values_20", |b| {
        b.iter(|| AttributeFingerprint::of(black_box(&attributes), true))
    });
    group.finish();
}

// =============================================================================
// STORAGE BENCHMARKS
// =============================================================================

fn bench_storage(c: &mut Criterion) {
    use consent_core::config::StoreConfig;
    use consent_core::crypto::{IdentifierHasher, InstallationSecret};
    use consent_core::storage::{ConsentStore, SqliteConsentStore};

    let secret = InstallationSecret::new("benchmark-installation-salt").unwrap();
    let user = IdentifierHasher::new(&secret)
        .hash("alice@example.org", "saml20-idp-hosted|https://idp.example.org")
        .unwrap();

    let store = SqliteConsentStore::in_memory(&StoreConfig::default()).unwrap();
    for i in 0..50 {
        store
            .save_consent(&user, &format!("sp{}", i), &"fp".into())
            .unwrap();
    }

    let mut group = c.benchmark_group("storage");
    group.bench_function("list_50_consents", |b| {
        b.iter(|| store.list_consents(black_box(&user)))
    });
    group.bench_function("has_consent", |b| {
        b.iter(|| store.has_consent(black_box(&user), black_box("sp25"), &"fp".into()))
    });
    group.finish();
}

// =============================================================================
// MAIN
// =============================================================================

criterion_group!(
    benches,
    bench_identifier_hashing,
    bench_fingerprint,
    bench_storage,
);

criterion_main!(benches);
