//! Shirt collection operations.

use super::{collections, Database};
use crate::error::AppError;
use crate::models::Shirt;

impl Database {
    /// Get a shirt by id (no ownership check).
    pub async fn get_shirt(&self, shirt_id: &str) -> Result<Option<Shirt>, AppError> {
        self.get(collections::SHIRTS, shirt_id).await
    }

    /// All shirts owned by a user, unordered.
    pub async fn list_shirts_for_user(&self, user_id: &str) -> Result<Vec<Shirt>, AppError> {
        self.find_by(collections::SHIRTS, "user", user_id).await
    }

    /// Create or replace a shirt.
    pub async fn save_shirt(&self, shirt: &Shirt) -> Result<(), AppError> {
        self.put(collections::SHIRTS, &shirt.id, shirt).await
    }

    pub async fn delete_shirt(&self, shirt_id: &str) -> Result<(), AppError> {
        self.delete(collections::SHIRTS, shirt_id).await
    }
}
