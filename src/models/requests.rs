use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to recommend meal bundles
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecommendationRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "restaurantId")]
    pub restaurant_id: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub mood: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default, alias = "hungerLevel")]
    pub hunger_level: Option<String>,
    /// Seed for the no-taste-signal shuffle, for reproducible results
    #[serde(default)]
    pub seed: Option<u64>,
}
