// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Audit & Debias Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks over a seeded 300-dimensional embedding with a
//! planted bias axis.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wordbias_core::{
    BiasDomain, BiasSession, DirectionIdentifier, EmbeddingStore, InMemoryEmbedding,
};
use wordbias_types::{AuditConfig, DebiasMethod, DirectionMethod};

const DIM: usize = 300;

fn planted(n_pairs: usize, n_neutral: usize) -> (InMemoryEmbedding, BiasDomain) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = InMemoryEmbedding::new(DIM).unwrap();
    let mut pairs = Vec::with_capacity(n_pairs);
    for i in 0..n_pairs {
        let base: Vec<f64> = (0..DIM)
            .map(|j| if j == 0 { 0.0 } else { rng.gen_range(-1.0..1.0) })
            .collect();
        let amount = rng.gen_range(0.5..1.0);
        let mut f = base.clone();
        let mut m = base;
        f[0] += amount;
        m[0] -= amount;
        let (fw, mw) = (format!("f{i}"), format!("m{i}"));
        store.insert(fw.clone(), f).unwrap();
        store.insert(mw.clone(), m).unwrap();
        pairs.push((fw, mw));
    }
    for i in 0..n_neutral {
        let v: Vec<f64> = (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect();
        store.insert(format!("w{i}"), v).unwrap();
    }
    let domain = BiasDomain {
        name: "planted".to_string(),
        positive_end: "f0".to_string(),
        negative_end: "m0".to_string(),
        definitional_pairs: pairs,
        direction_method: DirectionMethod::Pca,
        specific_words: Vec::new(),
        word_groups: Default::default(),
    };
    (store, domain)
}

// ── DirectionIdentifier (pca) ───────────────────────────────────────

fn bench_identify_pca(c: &mut Criterion) {
    let (store, domain) = planted(10, 100);
    let definitional = domain.definitional();
    let identifier = DirectionIdentifier::default();
    c.bench_function("identify_pca_10pairs_300d", |b| {
        b.iter(|| {
            identifier
                .identify(
                    &store,
                    black_box("f0"),
                    black_box("m0"),
                    &definitional,
                    DirectionMethod::Pca,
                )
                .unwrap()
        })
    });
}

// ── Metrics ─────────────────────────────────────────────────────────

fn bench_direct_bias(c: &mut Criterion) {
    let (store, domain) = planted(10, 5000);
    let session = BiasSession::with_domain(store, &domain, AuditConfig::default()).unwrap();
    let neutral: Vec<String> = session.domain().unwrap().neutral_words.clone();
    c.bench_function("direct_bias_5000w", |b| {
        b.iter(|| session.direct_bias(black_box(&neutral), 1.0).unwrap())
    });
}

fn bench_closest_words(c: &mut Criterion) {
    let (store, domain) = planted(10, 1000);
    let session = BiasSession::with_domain(store, &domain, AuditConfig::default()).unwrap();
    let words: Vec<String> = session.domain().unwrap().neutral_words.clone();
    c.bench_function("closest_words_1000w", |b| {
        b.iter(|| {
            session
                .closest_words_indirect_bias("w0", "w1", black_box(&words[2..]), 5)
                .unwrap()
        })
    });
}

// ── Hard debias ─────────────────────────────────────────────────────

fn bench_hard_debias(c: &mut Criterion) {
    let (store, domain) = planted(10, 5000);
    let session = BiasSession::with_domain(store, &domain, AuditConfig::default()).unwrap();
    c.bench_function("hard_debias_5000w", |b| {
        b.iter_batched(
            || session.clone(),
            |mut s| {
                s.debias(DebiasMethod::Hard, None, None, true).unwrap();
                black_box(s.store().len())
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_identify_pca,
    bench_direct_bias,
    bench_closest_words,
    bench_hard_debias,
);
criterion_main!(benches);
