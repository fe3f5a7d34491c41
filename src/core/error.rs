use thiserror::Error;

/// Errors from the profile/menu data source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Failure of an optional collaborator (vector index, embedding, text generation)
///
/// Always recovered locally through a fallback; never surfaced to the caller.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{service} timed out after {timeout_ms}ms")]
    Timeout { service: String, timeout_ms: u64 },

    #[error("{service} failed: {message}")]
    Failed { service: String, message: String },

    #[error("{service} returned an unusable response: {message}")]
    InvalidResponse { service: String, message: String },
}

impl CollaboratorError {
    pub fn timeout(service: impl Into<String>, timeout: std::time::Duration) -> Self {
        CollaboratorError::Timeout {
            service: service.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn failed(service: impl Into<String>, message: impl ToString) -> Self {
        CollaboratorError::Failed {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid(service: impl Into<String>, message: impl ToString) -> Self {
        CollaboratorError::InvalidResponse {
            service: service.into(),
            message: message.to_string(),
        }
    }
}

/// Errors surfaced by [`crate::core::Recommender::generate_recommendations`]
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// A bundle was about to carry a dish outside the safe candidate set.
    /// This is an internal logic bug and must fail the request.
    #[error("Safety invariant violated: dish {dish_id} in bundle {bundle:?} is not a safe candidate")]
    InvariantViolation { dish_id: String, bundle: String },
}

impl From<SourceError> for RecommendationError {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::NotFound(what) => RecommendationError::NotFound(what),
            SourceError::Unavailable(why) => RecommendationError::Unavailable(why),
        }
    }
}
