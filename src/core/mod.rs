// Core algorithm exports
pub mod bundles;
pub mod distance;
pub mod error;
pub mod explain;
pub mod filters;
pub mod ranking;
pub mod recommender;
pub mod traits;

pub use bundles::{BudgetCeilings, BundleSynthesizer};
pub use distance::euclidean_distance;
pub use error::{CollaboratorError, RecommendationError, SourceError};
pub use explain::{ExplanationContext, Explainer};
pub use filters::{filter_safe, is_safe_for};
pub use ranking::{DeterministicFallbackRanker, EuclideanIndex, Ranker, VectorRanker};
pub use recommender::{RecommendationQuery, Recommender, RecommenderOptions};
pub use traits::{EmbeddingProvider, MenuSource, Neighbor, TextGenerator, VectorIndex};
