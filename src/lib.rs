//! Curate - allergen-safe meal bundle recommendations
//!
//! Given a diner and a restaurant, the service filters the menu down to dishes
//! the diner can safely eat, ranks them by taste, and packages the best ones
//! into priced, explained bundles.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{filter_safe, RecommendationError, RecommendationQuery, Recommender};
pub use models::{Dish, MealBundle, Price, UserProfile};
