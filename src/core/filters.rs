use std::collections::BTreeSet;

use crate::models::{AllergenTag, ConstraintTag, Dish, SafeCandidate, UserProfile};

/// Why a dish was excluded from the safe candidate set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The dish carries allergens the diner must never be served
    Allergens(BTreeSet<AllergenTag>),
    /// The dish lacks tags for some of the diner's dietary constraints
    MissingConstraints(BTreeSet<ConstraintTag>),
}

/// Explain why a dish is unsafe for a profile, or `None` if it is safe
///
/// Rule A (allergens) is checked before Rule B (dietary constraints).
pub fn rejection_reason(profile: &UserProfile, dish: &Dish) -> Option<Rejection> {
    let blocked: BTreeSet<AllergenTag> = dish
        .allergen_tags
        .intersection(&profile.strict_allergens)
        .cloned()
        .collect();
    if !blocked.is_empty() {
        return Some(Rejection::Allergens(blocked));
    }

    let missing: BTreeSet<ConstraintTag> = profile
        .dietary_constraints
        .difference(&dish.dietary_tags)
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Some(Rejection::MissingConstraints(missing));
    }

    None
}

/// Check a single dish against both safety rules
///
/// Rule A: `dish.allergen_tags ∩ profile.strict_allergens` must be empty.
/// Rule B: `profile.dietary_constraints ⊆ dish.dietary_tags`.
#[inline]
pub fn is_safe_for(profile: &UserProfile, dish: &Dish) -> bool {
    dish.allergen_tags.is_disjoint(&profile.strict_allergens)
        && profile.dietary_constraints.is_subset(&dish.dietary_tags)
}

/// Build the safe candidate set for a profile
///
/// Keeps input order. Availability is not checked here; callers decide
/// whether unavailable dishes are excluded beforehand.
pub fn filter_safe(profile: &UserProfile, dishes: &[Dish]) -> Vec<SafeCandidate> {
    dishes
        .iter()
        .filter(|dish| match rejection_reason(profile, dish) {
            None => true,
            Some(reason) => {
                tracing::debug!("Excluded dish {} ({}): {:?}", dish.id, dish.name, reason);
                false
            }
        })
        .cloned()
        .map(SafeCandidate::admit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Price;

    fn dish(id: &str, allergens: &[&str], tags: &[&str]) -> Dish {
        Dish::new(id, "r1", format!("Dish {}", id), Price::from_cents(1000))
            .with_allergens(allergens)
            .with_tags(tags)
    }

    fn ids(candidates: &[SafeCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id()).collect()
    }

    #[test]
    fn test_allergen_dish_excluded() {
        let profile = UserProfile::new("u1").with_allergens(["peanuts"]);
        let dishes = vec![
            dish("satay", &["peanuts", "soy"], &[]),
            dish("salad", &[], &[]),
        ];

        assert_eq!(ids(&filter_safe(&profile, &dishes)), vec!["salad"]);
    }

    #[test]
    fn test_allergen_match_ignores_spelling() {
        let profile = UserProfile::new("u1").with_allergens(["Tree Nuts"]);
        let dishes = vec![dish("brownie", &["tree-nuts", "eggs"], &[])];

        assert!(filter_safe(&profile, &dishes).is_empty());
    }

    #[test]
    fn test_constraints_are_conjunctive() {
        let profile = UserProfile::new("u1").with_constraints(["vegan", "gluten_free"]);
        let dishes = vec![
            dish("a", &[], &["vegan"]),
            dish("b", &[], &["vegan", "gluten_free", "spicy"]),
            dish("c", &[], &[]),
        ];

        assert_eq!(ids(&filter_safe(&profile, &dishes)), vec!["b"]);
    }

    #[test]
    fn test_no_constraints_accepts_untagged() {
        let profile = UserProfile::new("u1");
        let dishes = vec![dish("a", &["gluten"], &[]), dish("b", &[], &[])];

        assert_eq!(ids(&filter_safe(&profile, &dishes)), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_preserves_order_and_is_idempotent() {
        let profile = UserProfile::new("u1").with_allergens(["fish"]);
        let dishes = vec![
            dish("z", &[], &[]),
            dish("salmon", &["fish"], &[]),
            dish("a", &[], &[]),
        ];

        let first = filter_safe(&profile, &dishes);
        let second = filter_safe(&profile, &dishes);

        assert_eq!(ids(&first), vec!["z", "a"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unavailable_dishes_not_filtered_here() {
        let profile = UserProfile::new("u1");
        let dishes = vec![dish("a", &[], &[]).unavailable()];

        assert_eq!(filter_safe(&profile, &dishes).len(), 1);
    }

    #[test]
    fn test_rejection_reason() {
        let profile = UserProfile::new("u1")
            .with_allergens(["peanuts"])
            .with_constraints(["vegan"]);

        let satay = dish("satay", &["peanuts"], &["vegan"]);
        let burger = dish("burger", &["dairy"], &[]);
        let salad = dish("salad", &[], &["vegan"]);

        assert_eq!(
            rejection_reason(&profile, &satay),
            Some(Rejection::Allergens(AllergenTag::set_from(["peanuts"])))
        );
        assert_eq!(
            rejection_reason(&profile, &burger),
            Some(Rejection::MissingConstraints(ConstraintTag::set_from(["vegan"])))
        );
        assert_eq!(rejection_reason(&profile, &salad), None);
        assert!(is_safe_for(&profile, &salad));
    }

    #[test]
    fn test_empty_menu() {
        let profile = UserProfile::new("u1").with_allergens(["peanuts"]);
        assert!(filter_safe(&profile, &[]).is_empty());
    }
}
