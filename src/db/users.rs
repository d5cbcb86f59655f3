// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User operations, including the account-deletion cascade.

use super::{collections, Database, UniqueKey};
use crate::error::AppError;
use crate::models::{Shirt, User, WishlistItem};

/// What an account deletion removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedUserData {
    pub shirts: usize,
    pub wishlist_items: usize,
}

impl Database {
    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get(collections::USERS, user_id).await
    }

    /// Find a user by (lowercase) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .find_by(collections::USERS, "email", &email.to_lowercase())
            .await?;
        Ok(users.into_iter().next())
    }

    /// Find a user by (lowercase) username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .find_by(collections::USERS, "username", &username.to_lowercase())
            .await?;
        Ok(users.into_iter().next())
    }

    /// Find the user linked to a Google account subject.
    pub async fn find_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .find_by(collections::USERS, "googleId", google_id)
            .await?;
        Ok(users.into_iter().next())
    }

    /// Create or update a user.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.put(collections::USERS, &user.id, user).await
    }

    /// Delete a user and everything they own.
    ///
    /// Hosted images must be released by the caller beforehand; this only
    /// removes documents:
    /// - `shirts` (query by user)
    /// - `wishlist` (query by user)
    /// - the user's email and username claims
    /// - `users/{user_id}`
    pub async fn delete_user_data(&self, user_id: &str) -> Result<DeletedUserData, AppError> {
        // 1. Delete all shirts
        let shirts: Vec<Shirt> = self.find_by(collections::SHIRTS, "user", user_id).await?;
        let shirt_ids: Vec<String> = shirts.into_iter().map(|s| s.id).collect();
        self.delete_many(collections::SHIRTS, &shirt_ids).await?;
        tracing::debug!(user_id, count = shirt_ids.len(), "Deleted shirts");

        // 2. Delete all wishlist items
        let items: Vec<WishlistItem> = self.find_by(collections::WISHLIST, "user", user_id).await?;
        let item_ids: Vec<String> = items.into_iter().map(|w| w.id).collect();
        self.delete_many(collections::WISHLIST, &item_ids).await?;
        tracing::debug!(user_id, count = item_ids.len(), "Deleted wishlist items");

        // 3. Free the email and username
        if let Some(user) = self.get_user(user_id).await? {
            self.release_key(UniqueKey::Email, &user.email).await?;
            if let Some(username) = &user.username {
                self.release_key(UniqueKey::Username, username).await?;
            }
        }

        // 4. Delete user profile
        self.delete(collections::USERS, user_id).await?;
        tracing::debug!(user_id, "Deleted user profile");

        let deleted = DeletedUserData {
            shirts: shirt_ids.len(),
            wishlist_items: item_ids.len(),
        };

        tracing::info!(
            user_id,
            shirts = deleted.shirts,
            wishlist_items = deleted.wishlist_items,
            "User data deletion complete"
        );

        Ok(deleted)
    }
}
