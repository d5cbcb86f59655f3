// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wishlist model: a shirt the user wants but does not own yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::shirt::{validate_amount, validate_season, wire_enum, ShirtSize, ShirtType};

wire_enum!(
    /// Kit type on a wishlist entry; `any` means the user has no preference.
    WishlistType {
        Any => "any",
        Home => "home",
        Away => "away",
        Third => "third",
        Fourth => "fourth",
        Goalkeeper => "goalkeeper",
        Special => "special",
        Training => "training",
        PreMatch => "pre-match",
    }
);

impl WishlistType {
    /// The concrete shirt type, or `None` for `any`.
    pub fn as_shirt_type(&self) -> Option<ShirtType> {
        match self {
            WishlistType::Any => None,
            other => other.as_str().parse().ok(),
        }
    }
}

impl Default for WishlistType {
    fn default() -> Self {
        WishlistType::Any
    }
}

wire_enum!(
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Wishlist record stored in the `wishlist` collection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner user id (immutable)
    pub user: String,
    #[validate(length(min = 1, max = 100, message = "Team name is required (max 100 characters)"))]
    pub team_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_season"))]
    pub season: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: WishlistType,
    #[serde(default)]
    #[validate(length(max = 50, message = "Brand cannot exceed 50 characters"))]
    pub brand: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Competition cannot exceed 100 characters"))]
    pub competition: Option<String>,
    #[serde(default)]
    pub size: Option<ShirtSize>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    #[validate(
        custom(function = "validate_amount"),
        range(min = 0.0, message = "Max budget cannot be negative")
    )]
    pub max_budget: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_has_no_shirt_type() {
        assert_eq!(WishlistType::Any.as_shirt_type(), None);
        assert_eq!(
            WishlistType::PreMatch.as_shirt_type(),
            Some(ShirtType::PreMatch)
        );
    }

    #[test]
    fn test_defaults_on_sparse_record() {
        let item: WishlistItem = serde_json::from_value(serde_json::json!({
            "_id": "w1",
            "user": "u1",
            "teamName": "Napoli",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(item.kind, WishlistType::Any);
        assert_eq!(item.priority, Priority::Medium);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_bad_optional_season_rejected() {
        let item: WishlistItem = serde_json::from_value(serde_json::json!({
            "_id": "w1",
            "user": "u1",
            "teamName": "Napoli",
            "season": "86-87",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert!(item.validate().is_err());
    }

    #[test]
    fn test_non_finite_budget_rejected() {
        let mut item: WishlistItem = serde_json::from_value(serde_json::json!({
            "_id": "w1",
            "user": "u1",
            "teamName": "Napoli",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        item.max_budget = Some(f64::NAN);
        assert!(item.validate().is_err());
        item.max_budget = Some(f64::INFINITY);
        assert!(item.validate().is_err());
        item.max_budget = Some(80.0);
        assert!(item.validate().is_ok());
    }
}
