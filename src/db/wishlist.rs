//! Wishlist collection operations.

use super::{collections, Database};
use crate::error::AppError;
use crate::models::WishlistItem;

impl Database {
    pub async fn get_wishlist_item(&self, item_id: &str) -> Result<Option<WishlistItem>, AppError> {
        self.get(collections::WISHLIST, item_id).await
    }

    /// All wishlist items owned by a user, unordered.
    pub async fn list_wishlist_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<WishlistItem>, AppError> {
        self.find_by(collections::WISHLIST, "user", user_id).await
    }

    pub async fn save_wishlist_item(&self, item: &WishlistItem) -> Result<(), AppError> {
        self.put(collections::WISHLIST, &item.id, item).await
    }

    pub async fn delete_wishlist_item(&self, item_id: &str) -> Result<(), AppError> {
        self.delete(collections::WISHLIST, item_id).await
    }
}
