// Service exports
pub mod cache;
pub mod gemini;
pub mod memory;
pub mod mood;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use gemini::{GeminiClient, GeminiError};
pub use memory::InMemoryStore;
pub use mood::MoodEmbedder;
pub use postgres::{PostgresClient, PostgresError};
