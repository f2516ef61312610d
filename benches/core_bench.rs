//! Benchmarks for license issuance and validation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use time::macros::date;

use license_core::{
    issuer, keys, payload,
    signing::Ed25519Signer,
    util,
    validator::validate_on,
    LicensePayload,
};

fn bench_issue(c: &mut Criterion) {
    let pair = keys::generate_keypair();
    let signer = Ed25519Signer::new(pair.private_key().clone(), "bench");
    let today = date!(2024 - 01 - 01);

    c.bench_function("issue_token", |b| {
        b.iter(|| {
            issuer::issue_on(
                black_box(&signer),
                today,
                black_box("Pro"),
                365,
                Some("BENCH-HW"),
            )
            .unwrap()
        })
    });
}

fn bench_validate(c: &mut Criterion) {
    let pair = keys::generate_keypair();
    let signer = Ed25519Signer::new(pair.private_key().clone(), "bench");
    let today = date!(2024 - 01 - 01);
    let token = issuer::issue_on(&signer, today, "Pro", 365, Some("BENCH-HW")).unwrap();
    let pk = pair.public_key();

    c.bench_function("validate_token", |b| {
        b.iter(|| validate_on(today, &pk, black_box(&token), "Pro", Some("BENCH-HW")).unwrap())
    });
}

fn bench_payload_encode(c: &mut Criterion) {
    let p = LicensePayload {
        version: "Pro".into(),
        issued_at: date!(2024 - 01 - 01),
        expires_at: date!(2024 - 12 - 31),
        hardware_id: Some("BENCH-HW".into()),
    };
    c.bench_function("payload_encode", |b| {
        b.iter(|| payload::encode(black_box(&p)).unwrap())
    });
}

fn bench_sha256(c: &mut Criterion) {
    let data = vec![0u8; 1024];
    c.bench_function("sha256_1kb", |b| {
        b.iter(|| util::sha256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    bench_issue,
    bench_validate,
    bench_payload_encode,
    bench_sha256
);
criterion_main!(benches);
