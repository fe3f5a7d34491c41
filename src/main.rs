use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use curate::config::{Settings, VectorBackend};
use curate::core::{Explainer, Recommender, VectorIndex};
use curate::core::ranking::EuclideanIndex;
use curate::routes::{self, AppState};
use curate::services::{CacheManager, GeminiClient, MoodEmbedder, PostgresClient};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging.level, &settings.logging.format);

    info!("Starting Curate recommendation service...");

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    let synthesizer = settings
        .bundles
        .synthesizer()
        .map_err(|e| startup_error("Invalid budget ceilings", e))?;

    let mut recommender = Recommender::new(postgres.clone())
        .with_synthesizer(synthesizer)
        .with_options(settings.ranking.recommender_options());

    let index: Option<Arc<dyn VectorIndex>> = match settings.ranking.vector_backend {
        VectorBackend::Postgres => Some(postgres.clone() as Arc<dyn VectorIndex>),
        VectorBackend::Memory => Some(Arc::new(EuclideanIndex) as Arc<dyn VectorIndex>),
        VectorBackend::Disabled => None,
    };
    if let Some(index) = index {
        info!("Vector ranking via {}", index.name());
        recommender = recommender.with_index(index);
    }

    let mut mood_embedder = None;

    match settings.gemini.api_key.clone().filter(|k| !k.is_empty()) {
        Some(api_key) => {
            let gemini = Arc::new(
                GeminiClient::new(
                    settings.gemini.endpoint.clone(),
                    api_key,
                    settings.gemini.embedding_model.clone(),
                    settings.gemini.generation_model.clone(),
                    Duration::from_secs(settings.gemini.request_timeout_secs),
                )
                .map_err(|e| startup_error("Failed to create Gemini client", e))?,
            );

            let cache = match CacheManager::connect(
                settings.cache.redis_url.as_deref(),
                settings.cache.l1_cache_size,
                settings.cache.ttl_secs,
            )
            .await
            {
                Ok(cache) => cache,
                Err(e) => {
                    warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                    CacheManager::in_memory(settings.cache.l1_cache_size, settings.cache.ttl_secs)
                }
            };

            info!(
                "Cache manager initialized (L1: {} entries, TTL: {}s)",
                settings.cache.l1_cache_size, settings.cache.ttl_secs
            );

            mood_embedder = Some(Arc::new(
                MoodEmbedder::new(
                    gemini.clone(),
                    gemini.embedding_model(),
                    Duration::from_millis(settings.gemini.embedding_timeout_ms),
                )
                .with_cache(Arc::new(cache)),
            ));

            if settings.explanation.enabled {
                recommender = recommender.with_explainer(Explainer::new(
                    gemini,
                    Duration::from_millis(settings.explanation.timeout_ms),
                ));
            }

            info!("Gemini client initialized");
        }
        None => warn!("No Gemini API key configured; moods are ignored and explanations use templates"),
    }

    let app_state = AppState {
        recommender,
        mood_embedder,
        postgres: Some(postgres),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
