use async_trait::async_trait;
use std::collections::HashMap;

use crate::core::error::SourceError;
use crate::core::traits::MenuSource;
use crate::models::{Dish, UserProfile};

/// In-process profile/menu store
///
/// Backs tests and benchmarks, and local runs without a database.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    profiles: HashMap<String, UserProfile>,
    menus: HashMap<String, Vec<Dish>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profiles.insert(profile.user_id.clone(), profile);
        self
    }

    /// Register a restaurant and its full menu (an empty menu is allowed)
    pub fn with_restaurant(mut self, restaurant_id: impl Into<String>, dishes: Vec<Dish>) -> Self {
        self.menus.insert(restaurant_id.into(), dishes);
        self
    }
}

#[async_trait]
impl MenuSource for InMemoryStore {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, SourceError> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("User {} not found", user_id)))
    }

    async fn list_dishes(&self, restaurant_id: &str) -> Result<Vec<Dish>, SourceError> {
        self.menus
            .get(restaurant_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("Restaurant {} not found", restaurant_id)))
    }
}
