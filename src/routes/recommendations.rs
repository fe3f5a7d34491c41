use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use tracing::Instrument;
use validator::Validate;

use crate::core::{RecommendationError, RecommendationQuery, Recommender};
use crate::models::{ErrorResponse, HealthResponse, RecommendationRequest};
use crate::services::{MoodEmbedder, PostgresClient};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    /// Turns request mood text into a query vector; absent without an API key
    pub mood_embedder: Option<Arc<MoodEmbedder>>,
    /// Pinged by the health check when the database backs the service
    pub postgres: Option<Arc<PostgresClient>>,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommendations", web::post().to(recommend));
}

/// Health check endpoint, served at `/health` and `/api/v1/health`
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Recommend meal bundles
///
/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "user_id": "string",
///   "restaurant_id": "string",
///   "mood": "something crispy",
///   "hunger_level": "starving",
///   "seed": 42
/// }
/// ```
///
/// Responds with a (possibly empty) JSON array of bundles.
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommendation request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let mut query = RecommendationQuery::new(req.user_id, req.restaurant_id);
    query.hunger_level = req.hunger_level;
    query.seed = req.seed;

    if let Some(mood) = req.mood.filter(|m| !m.trim().is_empty()) {
        let vector = match &state.mood_embedder {
            Some(embedder) => embedder.embed(&mood).await,
            None => None,
        };
        query = query.with_mood(mood, vector);
    }

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("recommend", %request_id);

    match state
        .recommender
        .generate_recommendations(&query)
        .instrument(span)
        .await
    {
        Ok(bundles) => HttpResponse::Ok().json(bundles),
        Err(RecommendationError::NotFound(what)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message: what,
            status_code: 404,
        }),
        Err(e @ RecommendationError::Unavailable(_)) => {
            tracing::error!("Recommendation failed for user {}: {}", query.user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load menu data".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
        Err(e @ RecommendationError::InvariantViolation { .. }) => {
            tracing::error!("Refusing to serve recommendations for user {}: {}", query.user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Internal error".to_string(),
                message: "Recommendations could not be produced safely".to_string(),
                status_code: 500,
            })
        }
    }
}
