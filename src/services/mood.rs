use std::sync::Arc;
use std::time::Duration;

use crate::core::error::CollaboratorError;
use crate::core::traits::EmbeddingProvider;
use crate::models::TasteVector;
use crate::services::cache::{CacheKey, CacheManager};

/// Embeds a diner's mood text, with caching and a timeout
///
/// Never fails: any provider or cache problem is logged and the request
/// proceeds without a mood vector.
pub struct MoodEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Option<Arc<CacheManager>>,
    model: String,
    timeout: Duration,
}

impl MoodEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            cache: None,
            model: model.into(),
            timeout,
        }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn embed(&self, mood: &str) -> Option<TasteVector> {
        let mood = mood.trim();
        if mood.is_empty() {
            return None;
        }

        let key = CacheKey::embedding(&self.model, mood);

        if let Some(cache) = &self.cache {
            match cache.get::<TasteVector>(&key).await {
                Ok(Some(vector)) => return Some(vector),
                Ok(None) => {}
                Err(e) => tracing::warn!("Embedding cache read failed: {}", e),
            }
        }

        let result = match tokio::time::timeout(self.timeout, self.provider.embed(mood)).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::timeout(self.provider.name(), self.timeout)),
        };

        match result {
            Ok(vector) if vector.is_usable() => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.set(&key, &vector).await {
                        tracing::warn!("Embedding cache write failed: {}", e);
                    }
                }
                Some(vector)
            }
            Ok(_) => {
                tracing::warn!("{} returned an unusable mood vector", self.provider.name());
                None
            }
            Err(e) => {
                tracing::warn!("Mood embedding failed, ranking without mood: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        vector: Vec<f32>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "CountingProvider"
        }

        async fn embed(&self, _text: &str) -> Result<TasteVector, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TasteVector::new(self.vector.clone()))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn name(&self) -> &str {
            "FailingProvider"
        }

        async fn embed(&self, _text: &str) -> Result<TasteVector, CollaboratorError> {
            Err(CollaboratorError::failed("FailingProvider", "quota exceeded"))
        }
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            vector: vec![1.0, 0.0],
        });
        let embedder = MoodEmbedder::new(provider.clone(), "m", Duration::from_secs(1))
            .with_cache(Arc::new(CacheManager::in_memory(10, 60)));

        assert!(embedder.embed("spicy").await.is_some());
        assert!(embedder.embed(" Spicy ").await.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_yield_none() {
        let embedder = MoodEmbedder::new(Arc::new(FailingProvider), "m", Duration::from_secs(1));
        assert_eq!(embedder.embed("spicy").await, None);
        assert_eq!(embedder.embed("   ").await, None);
    }

    #[tokio::test]
    async fn test_non_finite_vector_rejected() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            vector: vec![f32::NAN, 1.0],
        });
        let embedder = MoodEmbedder::new(provider, "m", Duration::from_secs(1));
        assert_eq!(embedder.embed("spicy").await, None);
    }
}
