use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{
    bundles::BundleSynthesizer,
    error::RecommendationError,
    explain::{ExplanationContext, Explainer},
    filters::{filter_safe, is_safe_for},
    ranking::{DeterministicFallbackRanker, Ranker, VectorRanker},
    traits::{MenuSource, VectorIndex},
};
use crate::models::{MealBundle, RankedCandidate, RankingBasis, SafeCandidate, TasteVector, UserProfile};

/// Inputs of one recommendation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationQuery {
    pub user_id: String,
    pub restaurant_id: String,
    pub mood: Option<String>,
    /// Pre-computed embedding of `mood`; the core never calls an embedding service
    pub mood_vector: Option<TasteVector>,
    pub hunger_level: Option<String>,
    pub seed: Option<u64>,
}

impl RecommendationQuery {
    pub fn new(user_id: impl Into<String>, restaurant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            restaurant_id: restaurant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>, vector: Option<TasteVector>) -> Self {
        self.mood = Some(mood.into());
        self.mood_vector = vector;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Tuning knobs for the pipeline
#[derive(Debug, Clone)]
pub struct RecommenderOptions {
    /// Ranked candidates handed to the bundle synthesizer
    pub top_k: usize,
    /// Expected embedding dimension; `None` accepts any
    pub taste_dimension: Option<usize>,
    pub exclude_unavailable: bool,
    pub ranking_timeout: Duration,
}

impl Default for RecommenderOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            taste_dimension: None,
            exclude_unavailable: true,
            ranking_timeout: Duration::from_millis(1500),
        }
    }
}

/// Main recommendation orchestrator
///
/// # Pipeline Stages
/// 1. Fetch profile and menu
/// 2. Safety filter (allergens, dietary constraints)
/// 3. Ranking (vector index, or deterministic fallback)
/// 4. Bundle synthesis
/// 5. Containment check against the safe set
/// 6. Explanations
#[derive(Clone)]
pub struct Recommender {
    source: Arc<dyn MenuSource>,
    index: Option<Arc<dyn VectorIndex>>,
    synthesizer: BundleSynthesizer,
    explainer: Explainer,
    options: RecommenderOptions,
}

impl Recommender {
    pub fn new(source: Arc<dyn MenuSource>) -> Self {
        Self {
            source,
            index: None,
            synthesizer: BundleSynthesizer::default(),
            explainer: Explainer::template_only(),
            options: RecommenderOptions::default(),
        }
    }

    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: BundleSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_options(mut self, options: RecommenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Recommend meal bundles for a diner at a restaurant
    ///
    /// # Returns
    /// * `Ok(vec![])` when no dish on the menu is safe for the diner
    /// * `Err(RecommendationError::NotFound)` for an unknown user or restaurant
    /// * `Err(RecommendationError::InvariantViolation)` if a bundle would
    ///   contain a dish outside the safe set
    pub async fn generate_recommendations(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Vec<MealBundle>, RecommendationError> {
        let profile = self.source.get_profile(&query.user_id).await?;
        let mut dishes = self.source.list_dishes(&query.restaurant_id).await?;
        let total_dishes = dishes.len();

        dishes.retain(|dish| {
            let same_restaurant = dish.restaurant_id == query.restaurant_id;
            if !same_restaurant {
                tracing::warn!(
                    "Dropping dish {} from restaurant {} while ranking restaurant {}",
                    dish.id,
                    dish.restaurant_id,
                    query.restaurant_id
                );
            }
            same_restaurant
        });
        if self.options.exclude_unavailable {
            dishes.retain(|dish| dish.available);
        }

        let safe = filter_safe(&profile, &dishes);
        tracing::debug!(
            "Safe candidates for user {} at {}: {} of {} dishes",
            query.user_id,
            query.restaurant_id,
            safe.len(),
            total_dishes
        );

        if safe.is_empty() {
            tracing::info!(
                "No safe options for user {} at restaurant {}",
                query.user_id,
                query.restaurant_id
            );
            return Ok(Vec::new());
        }

        let ranked = self.rank(&profile, query, &safe).await;
        let mut bundles = self.synthesizer.synthesize(&ranked, profile.budget_tier);

        ensure_contained(&profile, &safe, &bundles)?;

        let basis = ranked
            .first()
            .map(|r| r.basis)
            .unwrap_or(RankingBasis::Arbitrary);
        let context = ExplanationContext::from_profile(
            &profile,
            query.mood.as_deref(),
            query.hunger_level.as_deref(),
            basis,
        );
        for bundle in &mut bundles {
            bundle.explanation = self.explainer.explain_bundle(bundle, &context).await;
        }

        tracing::info!(
            "Returning {} bundles for user {} at restaurant {} (from {} safe candidates)",
            bundles.len(),
            query.user_id,
            query.restaurant_id,
            safe.len()
        );

        Ok(bundles)
    }

    /// Rank with the per-request strategy, degrading to the fallback on failure
    async fn rank(
        &self,
        profile: &UserProfile,
        query: &RecommendationQuery,
        safe: &[SafeCandidate],
    ) -> Vec<RankedCandidate> {
        let fallback = DeterministicFallbackRanker::new(query.seed);
        let ranker = self.select_ranker(profile, query);

        match ranker.rank(safe, self.options.top_k).await {
            Ok(ranked) => {
                tracing::debug!("Ranked {} candidates with {}", ranked.len(), ranker.name());
                ranked
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed, falling back to {}: {}",
                    ranker.name(),
                    fallback.name(),
                    e
                );
                fallback.order(safe, self.options.top_k)
            }
        }
    }

    fn select_ranker(&self, profile: &UserProfile, query: &RecommendationQuery) -> Box<dyn Ranker> {
        let fallback = Box::new(DeterministicFallbackRanker::new(query.seed));

        let Some(vector) = self.query_vector(profile, query) else {
            return fallback;
        };
        let Some(index) = &self.index else {
            tracing::debug!("No vector index configured, using fallback ranking");
            return fallback;
        };

        Box::new(VectorRanker::new(
            index.clone(),
            vector,
            self.options.ranking_timeout,
        ))
    }

    /// The mood embedding wins over the stored taste vector
    ///
    /// An unusable mood embedding yields to the profile's taste vector
    /// before the request degrades to fallback ordering.
    fn query_vector(&self, profile: &UserProfile, query: &RecommendationQuery) -> Option<TasteVector> {
        query
            .mood_vector
            .as_ref()
            .filter(|vector| self.accepts(vector, "mood", &profile.user_id))
            .or_else(|| {
                profile
                    .taste_vector
                    .as_ref()
                    .filter(|vector| self.accepts(vector, "profile", &profile.user_id))
            })
            .cloned()
    }

    fn accepts(&self, vector: &TasteVector, origin: &str, user_id: &str) -> bool {
        if !vector.is_usable() {
            tracing::warn!("Ignoring unusable {} vector for user {}", origin, user_id);
            return false;
        }
        match self.options.taste_dimension {
            Some(expected) if vector.dimension() != expected => {
                tracing::warn!(
                    "Ignoring {} vector of dimension {} (expected {}) for user {}",
                    origin,
                    vector.dimension(),
                    expected,
                    user_id
                );
                false
            }
            _ => true,
        }
    }
}

/// Every bundled dish must be a safe candidate, and still pass the safety rules
fn ensure_contained(
    profile: &UserProfile,
    safe: &[SafeCandidate],
    bundles: &[MealBundle],
) -> Result<(), RecommendationError> {
    let safe_ids: HashSet<&str> = safe.iter().map(|c| c.id()).collect();

    for bundle in bundles {
        for dish in &bundle.dishes {
            if !safe_ids.contains(dish.id.as_str()) || !is_safe_for(profile, dish) {
                tracing::error!(
                    "Safety invariant violated: dish {} in bundle {:?} for user {}",
                    dish.id,
                    bundle.title,
                    profile.user_id
                );
                return Err(RecommendationError::InvariantViolation {
                    dish_id: dish.id.clone(),
                    bundle: bundle.title.clone(),
                });
            }
        }
    }

    Ok(())
}
