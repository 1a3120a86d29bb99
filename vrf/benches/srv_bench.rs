use criterion::{black_box, criterion_group, criterion_main, Criterion};

use srand_crypto::OsRandom;
use srand_protocol::Commit;
use srand_types::{AuthorityDirectory, AuthorityId, Timestamp};
use srand_vrf::compute_srv;

struct Everyone;

impl AuthorityDirectory for Everyone {
    fn my_identity(&self) -> AuthorityId {
        AuthorityId::new([0; 20])
    }

    fn is_known_authority(&self, _id: &AuthorityId) -> bool {
        true
    }

    fn n_authorities(&self) -> usize {
        9
    }
}

fn generate_commit_bench(c: &mut Criterion) {
    let id = AuthorityId::new([1; 20]);

    c.bench_function("generate_commit", |b| {
        b.iter(|| Commit::generate(black_box(Timestamp::new(86_400)), id, &OsRandom))
    });
}

fn verify_commit_bench(c: &mut Criterion) {
    let commit = Commit::generate(Timestamp::new(86_400), AuthorityId::new([1; 20]), &OsRandom)
        .expect("commit");

    c.bench_function("verify_commit_and_reveal", |b| {
        b.iter(|| black_box(&commit).verify_commit_and_reveal())
    });
}

fn compute_srv_9_bench(c: &mut Criterion) {
    let commits: Vec<Commit> = (0..9u8)
        .map(|i| {
            Commit::generate(Timestamp::new(86_400), AuthorityId::new([i; 20]), &OsRandom)
                .expect("commit")
        })
        .collect();

    c.bench_function("compute_srv_9_authorities", |b| {
        b.iter(|| compute_srv(black_box(&commits), None, &Everyone))
    });
}

criterion_group!(
    benches,
    generate_commit_bench,
    verify_commit_bench,
    compute_srv_9_bench,
);
criterion_main!(benches);
