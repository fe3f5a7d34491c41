// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    normalize_tag, AllergenTag, BudgetTier, ConstraintTag, Dish, MealBundle, Price, PriceError,
    RankedCandidate, RankingBasis, SafeCandidate, TasteVector, UserProfile,
};
pub use requests::RecommendationRequest;
pub use responses::{ErrorResponse, HealthResponse};
