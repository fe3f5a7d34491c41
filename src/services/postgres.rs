use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseSettings;
use crate::core::error::{CollaboratorError, SourceError};
use crate::core::traits::{MenuSource, Neighbor, VectorIndex};
use crate::models::{AllergenTag, BudgetTier, ConstraintTag, Dish, Price, SafeCandidate, TasteVector, UserProfile};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Invalid vector literal: {0}")]
    InvalidVector(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl From<PostgresError> for SourceError {
    fn from(value: PostgresError) -> Self {
        SourceError::Unavailable(value.to_string())
    }
}

/// PostgreSQL (pgvector) reader for profiles, menus and taste similarity
///
/// The schema belongs to the service that writes users and dishes; this
/// client only reads. Vector columns are exchanged in pgvector's text form
/// (`[0.1,0.2,...]`), so no driver extension is needed.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Fetch a diner profile, `None` if the user does not exist
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, PostgresError> {
        let query = r#"
            SELECT id, constraints, allergens_strict, budget_setting,
                   taste_embedding::text AS taste_embedding
            FROM users
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    pub async fn restaurant_exists(&self, restaurant_id: &str) -> Result<bool, PostgresError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM restaurants WHERE id = $1)")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<bool, _>(0)?)
    }

    /// Fetch every dish of a restaurant, available or not
    pub async fn fetch_dishes(&self, restaurant_id: &str) -> Result<Vec<Dish>, PostgresError> {
        let query = r#"
            SELECT id, restaurant_id, name, description, price, allergens, tags,
                   is_available, embedding::text AS embedding
            FROM dishes
            WHERE restaurant_id = $1
            ORDER BY id
        "#;

        let rows = sqlx::query(query)
            .bind(restaurant_id)
            .fetch_all(&self.pool)
            .await?;

        let dishes = rows.iter().map(dish_from_row).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Restaurant {} has {} dishes", restaurant_id, dishes.len());

        Ok(dishes)
    }

    /// Order the given dishes by L2 distance (`<->`) to `query`
    ///
    /// Only dishes listed in `dish_ids` that have an embedding are returned.
    pub async fn nearest_dishes(
        &self,
        query: &TasteVector,
        dish_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Neighbor>, PostgresError> {
        let sql = r#"
            SELECT id, (embedding <-> $1::text::vector)::float8 AS distance
            FROM dishes
            WHERE id = ANY($2) AND embedding IS NOT NULL
            ORDER BY distance ASC, id ASC
            LIMIT $3
        "#;

        let rows = sqlx::query(sql)
            .bind(to_vector_literal(query))
            .bind(dish_ids.to_vec())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<Neighbor, PostgresError> {
                Ok(Neighbor {
                    dish_id: row.try_get("id")?,
                    distance: row.try_get::<f64, _>("distance")? as f32,
                })
            })
            .collect()
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl MenuSource for PostgresClient {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, SourceError> {
        match self.fetch_profile(user_id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(SourceError::NotFound(format!("User {} not found", user_id))),
            Err(e) => {
                tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
                Err(e.into())
            }
        }
    }

    async fn list_dishes(&self, restaurant_id: &str) -> Result<Vec<Dish>, SourceError> {
        if !self.restaurant_exists(restaurant_id).await? {
            return Err(SourceError::NotFound(format!(
                "Restaurant {} not found",
                restaurant_id
            )));
        }

        self.fetch_dishes(restaurant_id).await.map_err(|e| {
            tracing::error!("Failed to fetch dishes for {}: {}", restaurant_id, e);
            e.into()
        })
    }
}

#[async_trait]
impl VectorIndex for PostgresClient {
    fn name(&self) -> &str {
        "pgvector"
    }

    async fn nearest(
        &self,
        query: &TasteVector,
        candidates: &[SafeCandidate],
        limit: usize,
    ) -> Result<Vec<Neighbor>, CollaboratorError> {
        let ids: Vec<String> = candidates.iter().map(|c| c.id().to_string()).collect();

        self.nearest_dishes(query, &ids, limit)
            .await
            .map_err(|e| CollaboratorError::failed(self.name(), e))
    }
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, PostgresError> {
    let constraints: Option<Vec<String>> = row.try_get("constraints")?;
    let allergens: Option<Vec<String>> = row.try_get("allergens_strict")?;
    let budget_setting: Option<i32> = row.try_get("budget_setting")?;
    let embedding: Option<String> = row.try_get("taste_embedding")?;

    Ok(UserProfile {
        user_id: row.try_get("id")?,
        strict_allergens: AllergenTag::set_from(allergens.unwrap_or_default()),
        dietary_constraints: ConstraintTag::set_from(constraints.unwrap_or_default()),
        taste_vector: embedding.as_deref().map(parse_vector_literal).transpose()?,
        budget_tier: budget_setting.map(BudgetTier::from_setting).unwrap_or_default(),
    })
}

fn dish_from_row(row: &PgRow) -> Result<Dish, PostgresError> {
    let id: String = row.try_get("id")?;
    let price: f64 = row.try_get("price")?;
    let allergens: Option<Vec<String>> = row.try_get("allergens")?;
    let tags: Option<Vec<String>> = row.try_get("tags")?;
    let available: Option<bool> = row.try_get("is_available")?;
    let embedding: Option<String> = row.try_get("embedding")?;

    let price = Price::from_decimal(price)
        .map_err(|e| PostgresError::InvalidRow(format!("dish {}: {}", id, e)))?;

    Ok(Dish {
        restaurant_id: row.try_get("restaurant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price,
        allergen_tags: AllergenTag::set_from(allergens.unwrap_or_default()),
        dietary_tags: ConstraintTag::set_from(tags.unwrap_or_default()),
        available: available.unwrap_or(true),
        taste_vector: embedding.as_deref().map(parse_vector_literal).transpose()?,
        id,
    })
}

/// Parse pgvector's text form, e.g. `[0.5,-1,2e-3]`
pub fn parse_vector_literal(text: &str) -> Result<TasteVector, PostgresError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| PostgresError::InvalidVector(text.to_string()))?;

    if inner.trim().is_empty() {
        return Ok(TasteVector::new(Vec::new()));
    }

    inner
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .map_err(|_| PostgresError::InvalidVector(text.to_string()))
        })
        .collect::<Result<Vec<f32>, _>>()
        .map(TasteVector::new)
}

/// Render a vector in pgvector's text form
pub fn to_vector_literal(vector: &TasteVector) -> String {
    let values: Vec<String> = vector.as_slice().iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}
