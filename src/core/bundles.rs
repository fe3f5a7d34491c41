use crate::core::explain::{fallback_explanation, fallback_pairing};
use crate::models::{BudgetTier, Dish, MealBundle, Price, RankedCandidate};

pub const TOP_PICK: &str = "Top Pick";
pub const PAIRING: &str = "Pairing";
pub const BUDGET_COMBO: &str = "Budget Combo";

/// Maximum multi-dish bundle total per budget tier (`None` = no ceiling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCeilings {
    pub cheap: Option<Price>,
    pub moderate: Option<Price>,
    pub expensive: Option<Price>,
}

impl BudgetCeilings {
    /// No tier has a ceiling
    pub fn unlimited() -> Self {
        Self {
            cheap: None,
            moderate: None,
            expensive: None,
        }
    }

    pub fn ceiling_for(&self, tier: BudgetTier) -> Option<Price> {
        match tier {
            BudgetTier::Cheap => self.cheap,
            BudgetTier::Moderate => self.moderate,
            BudgetTier::Expensive => self.expensive,
        }
    }
}

impl Default for BudgetCeilings {
    fn default() -> Self {
        Self {
            cheap: Some(Price::from_cents(2_500)),
            moderate: Some(Price::from_cents(5_000)),
            expensive: None,
        }
    }
}

/// Turns a ranked candidate list into named, priced bundles
///
/// # Rules
/// 1. "Top Pick": the best candidate alone
/// 2. "Pairing": the two best candidates, unless over the tier's ceiling
/// 3. "Budget Combo" (opt-in): the two cheapest of at least three ranked
///    candidates, unless identical to the Pairing or over the ceiling
///
/// Single-dish bundles are never gated on price.
#[derive(Debug, Clone, Default)]
pub struct BundleSynthesizer {
    ceilings: BudgetCeilings,
    budget_combo: bool,
}

impl BundleSynthesizer {
    pub fn new(ceilings: BudgetCeilings, budget_combo: bool) -> Self {
        Self {
            ceilings,
            budget_combo,
        }
    }

    pub fn synthesize(&self, ranked: &[RankedCandidate], tier: BudgetTier) -> Vec<MealBundle> {
        let mut bundles = Vec::new();
        let ceiling = self.ceilings.ceiling_for(tier);

        let Some(top) = ranked.first() else {
            return bundles;
        };

        bundles.push(MealBundle {
            title: TOP_PICK.to_string(),
            dishes: vec![top.dish().clone()],
            total_price: top.dish().price,
            explanation: fallback_explanation(top.dish(), top.basis),
        });

        if let Some(second) = ranked.get(1) {
            let main = top.dish();
            let side = second.dish();
            match main.price.checked_add(side.price) {
                Some(total) if within(total, ceiling) => bundles.push(MealBundle {
                    title: PAIRING.to_string(),
                    dishes: vec![main.clone(), side.clone()],
                    total_price: total,
                    explanation: fallback_pairing(main, side),
                }),
                Some(total) => tracing::debug!(
                    "Skipping {}: total {} exceeds {:?} ceiling",
                    PAIRING,
                    total,
                    tier
                ),
                None => tracing::warn!("Skipping {}: total price overflows", PAIRING),
            }
        }

        if self.budget_combo && ranked.len() >= 3 {
            if let Some(bundle) = budget_combo(ranked, ceiling) {
                bundles.push(bundle);
            }
        }

        bundles
    }
}

#[inline]
fn within(total: Price, ceiling: Option<Price>) -> bool {
    ceiling.map_or(true, |max| total <= max)
}

fn budget_combo(ranked: &[RankedCandidate], ceiling: Option<Price>) -> Option<MealBundle> {
    let mut by_price: Vec<&RankedCandidate> = ranked.iter().collect();
    by_price.sort_by_key(|r| (r.dish().price, r.rank));

    let first = by_price[0].dish();
    let second = by_price[1].dish();

    let same_as_pairing = [first.id.as_str(), second.id.as_str()]
        .iter()
        .all(|id| *id == ranked[0].dish().id || *id == ranked[1].dish().id);
    if same_as_pairing {
        return None;
    }

    let total = first.price.checked_add(second.price)?;
    if !within(total, ceiling) {
        return None;
    }

    Some(MealBundle {
        title: BUDGET_COMBO.to_string(),
        dishes: vec![first.clone(), second.clone()],
        total_price: total,
        explanation: combo_explanation(first, second, total),
    })
}

fn combo_explanation(first: &Dish, second: &Dish, total: Price) -> String {
    format!(
        "Keep it light on the wallet: the {} and the {} for {} together.",
        first.name, second.name, total
    )
}
