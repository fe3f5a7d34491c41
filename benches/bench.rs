// Criterion benchmarks for Curate

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use curate::core::{euclidean_distance, filter_safe, BundleSynthesizer, DeterministicFallbackRanker};
use curate::models::{BudgetTier, Dish, Price, TasteVector, UserProfile};

const ALLERGENS: [&str; 4] = ["peanuts", "soy", "gluten", "dairy"];

fn create_dish(id: usize) -> Dish {
    let dish = Dish::new(
        format!("d{}", id),
        "bench",
        format!("Dish {}", id),
        Price::from_cents(500 + (id as u64 * 37) % 3000),
    )
    .with_taste_vector(vec![(id % 7) as f32 / 7.0; 768]);

    let dish = if id % 3 == 0 {
        dish.with_allergens([ALLERGENS[id % ALLERGENS.len()]])
    } else {
        dish
    };

    if id % 2 == 0 {
        dish.with_tags(["vegetarian"])
    } else {
        dish
    }
}

fn create_profile() -> UserProfile {
    UserProfile::new("bench_user")
        .with_allergens(["peanuts", "soy"])
        .with_constraints(["vegetarian"])
}

fn bench_filter_safe(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_safe");
    let profile = create_profile();

    for size in [10, 100, 1000].iter() {
        let menu: Vec<Dish> = (0..*size).map(create_dish).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| filter_safe(black_box(&profile), black_box(&menu)))
        });
    }

    group.finish();
}

fn bench_fallback_ranking(c: &mut Criterion) {
    let menu: Vec<Dish> = (0..200).map(create_dish).collect();
    let safe = filter_safe(&UserProfile::new("bench_user"), &menu);

    c.bench_function("fallback_seeded_shuffle", |b| {
        let ranker = DeterministicFallbackRanker::new(Some(7));
        b.iter(|| ranker.order(black_box(&safe), 3))
    });

    c.bench_function("fallback_id_order", |b| {
        let ranker = DeterministicFallbackRanker::new(None);
        b.iter(|| ranker.order(black_box(&safe), 3))
    });
}

fn bench_synthesize(c: &mut Criterion) {
    let menu: Vec<Dish> = (0..10).map(create_dish).collect();
    let safe = filter_safe(&UserProfile::new("bench_user"), &menu);
    let ranked = DeterministicFallbackRanker::new(None).order(&safe, 3);
    let synthesizer = BundleSynthesizer::default();

    c.bench_function("synthesize", |b| {
        b.iter(|| synthesizer.synthesize(black_box(&ranked), BudgetTier::Moderate))
    });
}

fn bench_euclidean_distance(c: &mut Criterion) {
    let a = TasteVector::new(vec![0.25; 768]);
    let b = TasteVector::new(vec![0.75; 768]);

    c.bench_function("euclidean_distance_768", |bench| {
        bench.iter(|| euclidean_distance(black_box(&a), black_box(&b)))
    });
}

criterion_group!(
    benches,
    bench_filter_safe,
    bench_fallback_ranking,
    bench_synthesize,
    bench_euclidean_distance
);
criterion_main!(benches);
