//! Benchmark tests for the token matching hot path.
//!
//! Every turn runs each token through the exact tier (whole-word containment
//! against all keywords) and, on a miss, the fuzzy tier (similarity scoring
//! against all keywords and knowledge triggers). This benchmark measures
//! both paths against a mid-sized catalog, since fuzzy scoring dominates
//! once exact matching fails.

use std::time::Duration;

use banter_core::config::{LexiconConfig, MatcherConfig};
use banter_engine::catalog::{ActionSpec, Catalog, CatalogPayload};
use banter_engine::matcher::Matcher;
use banter_engine::Knowledge;
use criterion::{criterion_group, criterion_main, Criterion};

/// Build a catalog with `n` actions, three keywords each.
fn generate_catalog(n: usize) -> Catalog {
    let actions = (0..n)
        .map(|i| ActionSpec {
            key: format!("action-{}", i),
            keywords: vec![
                format!("tell me about topic {}", i),
                format!("what do you think of subject {}", i),
                format!("topic {} please", i),
            ],
            phrases: vec![format!("Here is everything I know about topic {}.", i)],
            follow_up_keys: vec![format!("action-{}", (i + 1) % n)],
            reaction_keys: vec![format!("action-{}", i)],
        })
        .collect();
    let payload = CatalogPayload {
        actions,
        knowledge_base: vec![],
    };
    Catalog::from_payload(&payload).expect("benchmark catalog")
}

/// Build `n` knowledge facts with two triggers each.
fn generate_knowledge(n: usize) -> Vec<Knowledge> {
    (0..n)
        .map(|i| Knowledge {
            triggers: vec![
                format!("capital of country {}", i),
                format!("where is country {}", i),
            ],
            response: format!("City {}.", i),
        })
        .collect()
}

fn bench_token_resolution(c: &mut Criterion) {
    let catalog = generate_catalog(100);
    let knowledge = generate_knowledge(50);
    let matcher = Matcher::new(&MatcherConfig::default(), &LexiconConfig::default());

    let mut group = c.benchmark_group("token_resolution");
    group.sample_size(200);
    group.measurement_time(Duration::from_secs(10));

    // Exact hit: the keyword appears verbatim, the fuzzy tier never runs.
    group.bench_function("exact_hit", |b| {
        b.iter(|| matcher.resolve_token("could you tell me about topic 42 now", &catalog, &knowledge));
    });

    // Fuzzy hit: one typo, so every keyword and trigger is scored.
    group.bench_function("fuzzy_hit", |b| {
        b.iter(|| matcher.resolve_token("topic 42 plaese", &catalog, &knowledge));
    });

    // Full miss: scores everything and falls through to confused.
    group.bench_function("confused_miss", |b| {
        b.iter(|| matcher.resolve_token("xylophone quarterly rhubarb?", &catalog, &knowledge));
    });

    group.finish();
}

criterion_group!(benches, bench_token_resolution);
criterion_main!(benches);
