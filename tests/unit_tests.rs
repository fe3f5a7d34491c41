// Unit tests for Curate's public building blocks

use curate::core::bundles::{PAIRING, TOP_PICK};
use curate::core::filters::{rejection_reason, Rejection};
use curate::core::{
    euclidean_distance, filter_safe, is_safe_for, BundleSynthesizer, DeterministicFallbackRanker,
    EuclideanIndex, Ranker, VectorRanker,
};
use curate::models::{
    AllergenTag, BudgetTier, ConstraintTag, Dish, Price, RankingBasis, TasteVector, UserProfile,
};
use std::sync::Arc;
use std::time::Duration;

fn dish(id: &str, cents: u64) -> Dish {
    Dish::new(id, "r1", format!("Dish {}", id), Price::from_cents(cents))
}

#[test]
fn test_tag_normalization() {
    assert_eq!(AllergenTag::new(" Tree Nuts ").unwrap().as_str(), "tree_nuts");
    assert_eq!(AllergenTag::new("tree-nuts"), AllergenTag::new("TREE_NUTS"));
    assert!(ConstraintTag::new("   ").is_none());
}

#[test]
fn test_price_parsing() {
    assert_eq!(Price::from_decimal(12.5).unwrap(), Price::from_cents(1250));
    assert!(Price::from_decimal(-0.01).is_err());
    assert!(Price::from_decimal(f64::NAN).is_err());
    assert_eq!(Price::from_cents(1005).to_string(), "10.05");
}

#[test]
fn test_budget_setting_mapping() {
    assert_eq!(BudgetTier::from_setting(1), BudgetTier::Cheap);
    assert_eq!(BudgetTier::from_setting(2), BudgetTier::Moderate);
    assert_eq!(BudgetTier::from_setting(3), BudgetTier::Expensive);
    assert_eq!(BudgetTier::default(), BudgetTier::Moderate);
}

#[test]
fn test_allergen_rule_is_exact_set_intersection() {
    let profile = UserProfile::new("u1").with_allergens(["peanuts", "shellfish"]);

    assert!(!is_safe_for(&profile, &dish("a", 100).with_allergens(["Shellfish"])));
    assert!(is_safe_for(&profile, &dish("b", 100).with_allergens(["peanut_oil"])));
    assert!(is_safe_for(&profile, &dish("c", 100)));
}

#[test]
fn test_constraint_rule_requires_every_constraint() {
    let profile = UserProfile::new("u1").with_constraints(["vegan", "halal"]);
    let vegan_only = dish("a", 100).with_tags(["vegan"]);

    assert_eq!(
        rejection_reason(&profile, &vegan_only),
        Some(Rejection::MissingConstraints(ConstraintTag::set_from(["halal"])))
    );
    assert!(is_safe_for(&profile, &dish("b", 100).with_tags(["halal", "vegan", "spicy"])));
}

#[test]
fn test_allergens_reported_before_constraints() {
    let profile = UserProfile::new("u1").with_allergens(["soy"]).with_constraints(["vegan"]);
    let tofu = dish("a", 100).with_allergens(["soy"]);

    assert!(matches!(rejection_reason(&profile, &tofu), Some(Rejection::Allergens(_))));
}

#[test]
fn test_filter_empty_menu() {
    assert!(filter_safe(&UserProfile::new("u1"), &[]).is_empty());
}

#[test]
fn test_euclidean_distance() {
    let a = TasteVector::new(vec![0.0, 0.0]);
    let b = TasteVector::new(vec![3.0, 4.0]);

    assert_eq!(euclidean_distance(&a, &b), Some(5.0));
    assert_eq!(euclidean_distance(&a, &TasteVector::new(vec![1.0])), None);
}

#[test]
fn test_fallback_without_seed_sorts_by_id() {
    let safe = filter_safe(&UserProfile::new("u1"), &[dish("c", 100), dish("a", 100), dish("b", 100)]);
    let ranked = DeterministicFallbackRanker::new(None).order(&safe, 10);

    let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(ranked.iter().all(|r| r.basis == RankingBasis::Arbitrary));
}

#[test]
fn test_fallback_with_seed_is_reproducible() {
    let menu: Vec<Dish> = (0..10).map(|i| dish(&format!("d{}", i), 100)).collect();
    let safe = filter_safe(&UserProfile::new("u1"), &menu);

    let ranker = DeterministicFallbackRanker::new(Some(42));
    let first = tokio_test::block_on(ranker.rank(&safe, 5)).unwrap();
    let second = tokio_test::block_on(ranker.rank(&safe, 5)).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[tokio::test]
async fn test_vector_ranker_puts_vectorless_dishes_last() {
    let safe = filter_safe(
        &UserProfile::new("u1"),
        &[
            dish("plain", 100),
            dish("close", 100).with_taste_vector(vec![0.1, 0.1]),
            dish("far", 100).with_taste_vector(vec![4.0, 4.0]),
        ],
    );
    let ranker = VectorRanker::new(
        Arc::new(EuclideanIndex),
        TasteVector::new(vec![0.0, 0.0]),
        Duration::from_secs(1),
    );

    let ranked = ranker.rank(&safe, 3).await.unwrap();
    let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id()).collect();

    assert_eq!(ids, vec!["close", "far", "plain"]);
}

#[test]
fn test_synthesize_scenarios() {
    let synthesizer = BundleSynthesizer::default();
    let safe = filter_safe(&UserProfile::new("u1"), &[dish("a", 1000), dish("b", 1500)]);
    let ranked = DeterministicFallbackRanker::new(None).order(&safe, 3);

    let bundles = synthesizer.synthesize(&ranked, BudgetTier::Moderate);
    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0].title, TOP_PICK);
    assert_eq!(bundles[1].title, PAIRING);
    assert_eq!(bundles[1].total_price, Price::from_cents(2500));

    assert!(synthesizer.synthesize(&[], BudgetTier::Moderate).is_empty());
}
