use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use thiserror::Error;

/// Normalize a raw tag into its canonical form
///
/// Trims, lowercases, and joins words separated by whitespace or `-` with `_`,
/// so `"Tree Nuts"`, `"tree-nuts"` and `"tree_nuts"` all compare equal.
pub fn normalize_tag(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

macro_rules! tag_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Build a normalized tag, or `None` if nothing is left after normalization
            pub fn new(raw: &str) -> Option<Self> {
                let normalized = normalize_tag(raw);
                if normalized.is_empty() {
                    None
                } else {
                    Some(Self(normalized))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Build a tag set from raw strings, dropping blank entries
            pub fn set_from<I, S>(raw: I) -> BTreeSet<Self>
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                raw.into_iter()
                    .filter_map(|tag| Self::new(tag.as_ref()))
                    .collect()
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value).ok_or_else(|| format!("invalid tag: {:?}", value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

tag_type!(
    /// A substance a diner must never be served (e.g. `peanuts`)
    AllergenTag
);

tag_type!(
    /// A dietary requirement a dish must satisfy (e.g. `vegan`)
    ConstraintTag
);

/// Errors raised when building a [`Price`]
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PriceError {
    #[error("price must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("price must not be negative, got {0}")]
    Negative(f64),

    #[error("price {0} exceeds the largest supported amount")]
    TooLarge(f64),
}

/// Non-negative money amount held in minor units (cents)
///
/// Serialized as a decimal number (`12.5`), summed exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const ZERO: Price = Price { cents: 0 };
    /// Largest amount accepted from decimal input (10 billion)
    pub const MAX: Price = Price {
        cents: 1_000_000_000_000,
    };

    pub const fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Convert a decimal amount, rounding to the nearest cent
    pub fn from_decimal(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotFinite(value));
        }
        if value < 0.0 {
            return Err(PriceError::Negative(value));
        }
        let cents = (value * 100.0).round();
        if cents > Self::MAX.cents as f64 {
            return Err(PriceError::TooLarge(value));
        }
        Ok(Self {
            cents: cents as u64,
        })
    }

    /// `None` when the sum does not fit
    pub fn checked_add(self, rhs: Price) -> Option<Price> {
        self.cents.checked_add(rhs.cents).map(Price::from_cents)
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl TryFrom<f64> for Price {
    type Error = PriceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.as_f64()
    }
}

impl Add for Price {
    type Output = Price;

    /// Saturates at `u64::MAX` cents; use [`Price::checked_add`] to detect overflow
    fn add(self, rhs: Price) -> Price {
        Price {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// Semantic taste embedding for users, dishes and moods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TasteVector(Vec<f32>);

impl TasteVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// True when the vector is non-empty and has no NaN/infinite components
    pub fn is_usable(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f32>> for TasteVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Diner spending tier (stored as `budget_setting` 1..=3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BudgetTier {
    Cheap,
    #[default]
    Moderate,
    Expensive,
}

impl BudgetTier {
    /// Map a stored setting onto a tier; unknown values fall back to `Moderate`
    pub fn from_setting(setting: i32) -> Self {
        match setting {
            1 => BudgetTier::Cheap,
            3 => BudgetTier::Expensive,
            _ => BudgetTier::Moderate,
        }
    }
}

impl TryFrom<u8> for BudgetTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BudgetTier::Cheap),
            2 => Ok(BudgetTier::Moderate),
            3 => Ok(BudgetTier::Expensive),
            other => Err(format!("budget tier must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<BudgetTier> for u8 {
    fn from(value: BudgetTier) -> Self {
        match value {
            BudgetTier::Cheap => 1,
            BudgetTier::Moderate => 2,
            BudgetTier::Expensive => 3,
        }
    }
}

/// Diner profile used for one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub strict_allergens: BTreeSet<AllergenTag>,
    #[serde(default)]
    pub dietary_constraints: BTreeSet<ConstraintTag>,
    #[serde(default)]
    pub taste_vector: Option<TasteVector>,
    #[serde(default)]
    pub budget_tier: BudgetTier,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            strict_allergens: BTreeSet::new(),
            dietary_constraints: BTreeSet::new(),
            taste_vector: None,
            budget_tier: BudgetTier::default(),
        }
    }

    pub fn with_allergens<I, S>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.strict_allergens = AllergenTag::set_from(allergens);
        self
    }

    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dietary_constraints = ConstraintTag::set_from(constraints);
        self
    }

    pub fn with_taste_vector(mut self, vector: impl Into<TasteVector>) -> Self {
        self.taste_vector = Some(vector.into());
        self
    }

    pub fn with_budget_tier(mut self, tier: BudgetTier) -> Self {
        self.budget_tier = tier;
        self
    }
}

fn default_true() -> bool { true }

/// Menu item snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(rename = "allergens", default)]
    pub allergen_tags: BTreeSet<AllergenTag>,
    #[serde(rename = "tags", default)]
    pub dietary_tags: BTreeSet<ConstraintTag>,
    #[serde(rename = "is_available", default = "default_true")]
    pub available: bool,
    #[serde(default, skip_serializing)]
    pub taste_vector: Option<TasteVector>,
}

impl Dish {
    pub fn new(
        id: impl Into<String>,
        restaurant_id: impl Into<String>,
        name: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            restaurant_id: restaurant_id.into(),
            name: name.into(),
            description: None,
            price,
            allergen_tags: BTreeSet::new(),
            dietary_tags: BTreeSet::new(),
            available: true,
            taste_vector: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allergens<I, S>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allergen_tags = AllergenTag::set_from(allergens);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dietary_tags = ConstraintTag::set_from(tags);
        self
    }

    pub fn with_taste_vector(mut self, vector: impl Into<TasteVector>) -> Self {
        self.taste_vector = Some(vector.into());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

/// A dish that passed the safety filter for one profile
///
/// Only [`crate::core::filters::filter_safe`] can build one.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeCandidate(Dish);

impl SafeCandidate {
    pub(crate) fn admit(dish: Dish) -> Self {
        Self(dish)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn dish(&self) -> &Dish {
        &self.0
    }

    pub fn into_dish(self) -> Dish {
        self.0
    }
}

/// What an ordering of candidates is actually based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingBasis {
    /// Ordered by distance to the diner's taste or mood vector
    Taste,
    /// No taste signal; seeded shuffle or id order
    Arbitrary,
}

/// Safe candidate with its position in the ranking (0 = best)
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub candidate: SafeCandidate,
    pub rank: usize,
    /// Distance to the query vector; lower is closer. Never exposed to callers.
    pub score: Option<f32>,
    pub basis: RankingBasis,
}

impl RankedCandidate {
    pub fn dish(&self) -> &Dish {
        self.candidate.dish()
    }
}

/// Named, priced, explained grouping of one or two safe dishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealBundle {
    pub title: String,
    pub dishes: Vec<Dish>,
    pub total_price: Price,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_normalization() {
        assert_eq!(normalize_tag("  Tree Nuts "), "tree_nuts");
        assert_eq!(normalize_tag("gluten-free"), "gluten_free");
        assert_eq!(normalize_tag("PEANUTS"), "peanuts");
        assert!(AllergenTag::new("   ").is_none());
    }

    #[test]
    fn test_tag_set_drops_blanks() {
        let tags = AllergenTag::set_from(["Peanuts", "", "peanuts", "soy"]);
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_price_from_decimal() {
        assert_eq!(Price::from_decimal(12.5).unwrap().cents(), 1250);
        assert_eq!(Price::from_decimal(0.1 + 0.2).unwrap().cents(), 30);
        assert!(matches!(Price::from_decimal(-1.0), Err(PriceError::Negative(_))));
        assert!(matches!(Price::from_decimal(f64::NAN), Err(PriceError::NotFinite(_))));
    }

    #[test]
    fn test_price_huge_amounts() {
        assert!(matches!(Price::from_decimal(1e300), Err(PriceError::TooLarge(_))));
        assert_eq!(Price::from_decimal(1e10).unwrap(), Price::MAX);

        let max = Price::from_cents(u64::MAX);
        assert_eq!(max.checked_add(Price::from_cents(1)), None);
        assert_eq!(max + Price::from_cents(1), max);
    }

    #[test]
    fn test_price_display_and_sum() {
        let total: Price = [Price::from_cents(1000), Price::from_cents(1505)].into_iter().sum();
        assert_eq!(total.to_string(), "25.05");
    }

    #[test]
    fn test_budget_tier_from_setting() {
        assert_eq!(BudgetTier::from_setting(1), BudgetTier::Cheap);
        assert_eq!(BudgetTier::from_setting(3), BudgetTier::Expensive);
        assert_eq!(BudgetTier::from_setting(9), BudgetTier::Moderate);
    }

    #[test]
    fn test_dish_json_hides_taste_vector() {
        let dish = Dish::new("d1", "r1", "Salad", Price::from_cents(1000))
            .with_taste_vector(vec![0.1, 0.2]);
        let json = serde_json::to_value(&dish).unwrap();

        assert_eq!(json["price"], 10.0);
        assert!(json.get("taste_vector").is_none());
    }

    #[test]
    fn test_dish_json_normalizes_tags() {
        let dish: Dish = serde_json::from_str(
            r#"{"id":"d1","restaurant_id":"r1","name":"Satay","price":12.0,"allergens":["Peanuts"]}"#,
        )
        .unwrap();

        assert!(dish.allergen_tags.contains(&AllergenTag::new("peanuts").unwrap()));
        assert!(dish.available);
    }
}
