//! Explanation adapter.
//!
//! Wraps an optional [`TextGenerator`] behind a timeout. Whatever happens to
//! the generator, a non-empty explanation comes back: the template fallback
//! is always available.

use std::sync::Arc;
use std::time::Duration;

use crate::core::bundles::PAIRING;
use crate::core::error::CollaboratorError;
use crate::core::traits::TextGenerator;
use crate::models::{Dish, MealBundle, RankingBasis, UserProfile};

/// Template explanation for a single dish
pub fn fallback_explanation(dish: &Dish, basis: RankingBasis) -> String {
    match basis {
        RankingBasis::Taste => format!(
            "Based on your taste profile, we think you'll love the {}.",
            dish.name
        ),
        RankingBasis::Arbitrary => format!(
            "The {} is a safe choice for you at this restaurant.",
            dish.name
        ),
    }
}

/// Template explanation for a main + side pairing
pub fn fallback_pairing(main: &Dish, side: &Dish) -> String {
    format!("Try the {} with a side of {}.", main.name, side.name)
}

/// Profile and mood summary handed to the generator
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationContext {
    pub basis: RankingBasis,
    pub summary: String,
}

impl ExplanationContext {
    pub fn new(basis: RankingBasis, summary: impl Into<String>) -> Self {
        Self {
            basis,
            summary: summary.into(),
        }
    }

    /// Summarize what the diner avoids, requires and asked for
    pub fn from_profile(
        profile: &UserProfile,
        mood: Option<&str>,
        hunger_level: Option<&str>,
        basis: RankingBasis,
    ) -> Self {
        let mut parts = Vec::new();

        if !profile.strict_allergens.is_empty() {
            let allergens: Vec<&str> = profile.strict_allergens.iter().map(|a| a.as_str()).collect();
            parts.push(format!("must avoid {}", allergens.join(", ")));
        }
        if !profile.dietary_constraints.is_empty() {
            let constraints: Vec<&str> =
                profile.dietary_constraints.iter().map(|c| c.as_str()).collect();
            parts.push(format!("eats {}", constraints.join(", ")));
        }
        if let Some(mood) = mood.map(str::trim).filter(|m| !m.is_empty()) {
            parts.push(format!("is in the mood for \"{}\"", mood));
        }
        if let Some(hunger) = hunger_level.map(str::trim).filter(|h| !h.is_empty()) {
            parts.push(format!("hunger level: {}", hunger));
        }

        let summary = if parts.is_empty() {
            "The diner has no stated restrictions.".to_string()
        } else {
            format!("The diner {}.", parts.join("; "))
        };

        Self { basis, summary }
    }
}

/// Boundary to the natural-language explanation generator
#[derive(Clone)]
pub struct Explainer {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl Explainer {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator: Some(generator),
            timeout,
        }
    }

    /// Explainer that only ever uses the templates
    pub fn template_only() -> Self {
        Self {
            generator: None,
            timeout: Duration::ZERO,
        }
    }

    /// Explain why a single dish fits the diner
    pub async fn explain(&self, dish: &Dish, context: &ExplanationContext) -> String {
        let prompt = dish_prompt(dish, context);
        match self.generate(&prompt).await {
            Some(text) => text,
            None => fallback_explanation(dish, context.basis),
        }
    }

    /// Explain why `side` goes with `main`
    pub async fn explain_pairing(&self, main: &Dish, side: &Dish, context: &ExplanationContext) -> String {
        let prompt = pairing_prompt(main, side, context);
        match self.generate(&prompt).await {
            Some(text) => text,
            None => fallback_pairing(main, side),
        }
    }

    /// Explain a whole bundle, keeping its template text on any failure
    pub async fn explain_bundle(&self, bundle: &MealBundle, context: &ExplanationContext) -> String {
        match bundle.dishes.as_slice() {
            [dish] => self.explain(dish, context).await,
            [main, side] if bundle.title == PAIRING => self.explain_pairing(main, side, context).await,
            _ => {
                let prompt = bundle_prompt(bundle, context);
                self.generate(&prompt)
                    .await
                    .unwrap_or_else(|| bundle.explanation.clone())
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Option<String> {
        let generator = self.generator.as_ref()?;

        let result = match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::timeout(generator.name(), self.timeout)),
        };

        match result {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("{} returned an empty explanation, using template", generator.name());
                None
            }
            Err(e) => {
                tracing::warn!("Explanation generation failed, using template: {}", e);
                None
            }
        }
    }
}

fn describe(dish: &Dish) -> String {
    match dish.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{} ({})", dish.name, description),
        None => dish.name.clone(),
    }
}

/// Keeps generated text from implying a taste match the ranking never made
fn ranking_note(basis: RankingBasis) -> &'static str {
    match basis {
        RankingBasis::Taste => "",
        RankingBasis::Arbitrary => {
            " These dishes were not chosen by taste match; do not claim they fit the diner's taste."
        }
    }
}

fn dish_prompt(dish: &Dish, context: &ExplanationContext) -> String {
    format!(
        "You are a friendly restaurant concierge. In one or two sentences, tell the diner \
         why they will enjoy {}. {} Do not mention ingredients the diner avoids and do not \
         make health claims.{}",
        describe(dish),
        context.summary,
        ranking_note(context.basis)
    )
}

fn pairing_prompt(main: &Dish, side: &Dish, context: &ExplanationContext) -> String {
    format!(
        "You are a friendly restaurant concierge. In one or two sentences, tell the diner \
         why {} goes well with a side of {}. {} Do not mention ingredients the diner avoids \
         and do not make health claims.{}",
        describe(main),
        describe(side),
        context.summary,
        ranking_note(context.basis)
    )
}

fn bundle_prompt(bundle: &MealBundle, context: &ExplanationContext) -> String {
    let dishes: Vec<String> = bundle.dishes.iter().map(describe).collect();
    format!(
        "You are a friendly restaurant concierge. In one or two sentences, explain why \
         \"{}\" ({}) works well together for this diner. {} Do not mention ingredients the \
         diner avoids and do not make health claims.{}",
        bundle.title,
        dishes.join(" + "),
        context.summary,
        ranking_note(context.basis)
    )
}
