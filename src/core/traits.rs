//! Collaborator interfaces consumed by the recommendation core.
//!
//! The core never talks to a database, an index or a model provider
//! directly. It receives implementations of these traits and treats every
//! optional one as replaceable by a deterministic fallback.

use async_trait::async_trait;

use crate::core::error::{CollaboratorError, SourceError};
use crate::models::{Dish, SafeCandidate, TasteVector, UserProfile};

/// Read-only source of profiles and menus
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// Fetch a diner profile, failing with `SourceError::NotFound` for unknown users
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, SourceError>;

    /// List every dish of a restaurant, failing with `SourceError::NotFound`
    /// when the restaurant does not exist
    async fn list_dishes(&self, restaurant_id: &str) -> Result<Vec<Dish>, SourceError>;
}

/// One entry of a nearest-neighbour answer
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub dish_id: String,
    pub distance: f32,
}

/// Nearest-neighbour ordering over a candidate-restricted set
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns the name of this index (for logging)
    fn name(&self) -> &str;

    /// Order `candidates` by ascending distance to `query`, at most `limit` entries.
    ///
    /// Implementations must only return ids taken from `candidates`.
    async fn nearest(
        &self,
        query: &TasteVector,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<Neighbor>, CollaboratorError>;
}

/// Turns free text (a mood) into a taste vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<TasteVector, CollaboratorError>;
}

/// Natural-language generator used for bundle explanations
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, CollaboratorError>;
}
