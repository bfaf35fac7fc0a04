//! # Logsig Benchmarks
//!
//! | Area | Operation | Scales with |
//! |------|-----------|-------------|
//! | Forest | `push` | amortized O(1) hashes per leaf |
//! | Forest | `root` | occupied slots, at most 64 |
//! | Signer | `add_record` | retention mode |
//! | Verifier | full replay | records and blocks |

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logsig_engine::domain::hashing::{hash_m, hash_r};
use logsig_engine::{
    BlockSigningApi, ErrorContext, HashAlgorithm, Imprint, LogVerifier, MerkleForest, SigningConfig,
    VerifyOptions,
};
use logsig_tests::support::{block_signer, lines, SignedLog};
use rand::Rng;

// ============================================================================
// Hashing and forest
// ============================================================================

fn random_leaf(alg: HashAlgorithm) -> Imprint {
    let mut rng = rand::thread_rng();
    let digest: Vec<u8> = (0..alg.digest_len()).map(|_| rng.gen()).collect();
    Imprint::new(alg, digest).expect("digest length matches")
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest");

    for alg in [HashAlgorithm::Sha2_256, HashAlgorithm::Sha2_512, HashAlgorithm::Sha3_256] {
        let leaves: Vec<Imprint> = (0..1024).map(|_| random_leaf(alg)).collect();
        group.throughput(Throughput::Elements(leaves.len() as u64));
        group.bench_with_input(BenchmarkId::new("push_1024", alg.name()), &leaves, |b, leaves| {
            b.iter(|| {
                let mut forest = MerkleForest::new(alg);
                for leaf in leaves {
                    black_box(forest.push(leaf.clone()).expect("forest has room"));
                }
                black_box(forest.root().expect("non-empty"))
            })
        });
    }

    let alg = HashAlgorithm::Sha2_256;
    let x_prev = random_leaf(alg);
    let iv = vec![0x5a; alg.digest_len()];
    group.bench_function("mask_and_leaf", |b| {
        b.iter(|| {
            let mask = hash_m(alg, black_box(&x_prev), &iv).expect("hash");
            black_box(hash_r(alg, &mask, b"Oct 17 10:00:00 host sshd[1]: accepted").expect("hash"))
        })
    });

    group.finish();
}

// ============================================================================
// Signing
// ============================================================================

fn bench_add_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("signer");
    group.measurement_time(Duration::from_secs(5));

    let modes = [
        ("no_retention", SigningConfig::default()),
        ("record_hashes", SigningConfig::default().with_keep_record_hashes(true)),
        (
            "all_hashes",
            SigningConfig::default()
                .with_keep_record_hashes(true)
                .with_keep_tree_hashes(true),
        ),
    ];
    let records = lines(0, 256);

    for (name, config) in modes {
        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(BenchmarkId::new("block_of_256", name), &records, |b, records| {
            let fx = SignedLog::new(config.clone());
            let mut file = fx.open();
            b.iter(|| {
                for line in records {
                    file.add_record(line.as_bytes()).expect("add record");
                }
                black_box(file.finish_block().expect("finish block"))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Verification
// ============================================================================

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verifier");

    for block_size in [16usize, 256] {
        let fx = SignedLog::new(
            SigningConfig::default()
                .with_keep_record_hashes(true)
                .with_keep_tree_hashes(true),
        );
        let blocks: Vec<Vec<String>> = (0..4).map(|i| lines(i * block_size, block_size)).collect();
        fx.sign_blocks(&blocks);
        let log = fx.log_bytes();
        let sig = fx.sig_bytes();
        let verifier = LogVerifier::new(Arc::new(block_signer().verifier()), VerifyOptions::default());

        group.throughput(Throughput::Elements((4 * block_size) as u64));
        group.bench_function(BenchmarkId::new("four_blocks", block_size), |b| {
            b.iter(|| {
                let mut ectx = ErrorContext::new("bench.log");
                black_box(
                    verifier
                        .verify(
                            &mut &log[..],
                            &mut Cursor::new(&sig),
                            None::<&mut Vec<u8>>,
                            &mut std::io::sink(),
                            &mut ectx,
                        )
                        .expect("verifies"),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_forest, bench_add_record, bench_verify);
criterion_main!(benches);
