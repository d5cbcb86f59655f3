// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wishlist routes.

use super::form::MultipartForm;
use super::shirts::{blank_shirt, insert_from_form, required_condition};
use super::{json_body, ApiResponse};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::shirt::MAX_SHIRT_IMAGES;
use crate::models::{Priority, Shirt, ShirtSize, WishlistItem, WishlistType};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Wishlist routes (require a complete profile; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/wishlist", get(list_items).post(create_item))
        .route(
            "/api/wishlist/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/api/wishlist/{id}/add-to-collection",
            post(add_to_collection),
        )
}

/// Create/update body. On update, absent fields are left unchanged and
/// empty strings clear optional text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WishlistInput {
    team_name: Option<String>,
    season: Option<String>,
    #[serde(rename = "type")]
    kind: Option<WishlistType>,
    brand: Option<String>,
    competition: Option<String>,
    size: Option<ShirtSize>,
    priority: Option<Priority>,
    max_budget: Option<f64>,
    notes: Option<String>,
}

fn cleared(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl WishlistInput {
    fn apply(self, item: &mut WishlistItem) {
        if let Some(team) = self.team_name {
            item.team_name = team.trim().to_string();
        }
        if let Some(season) = self.season {
            item.season = cleared(season);
        }
        if let Some(kind) = self.kind {
            item.kind = kind;
        }
        if let Some(brand) = self.brand {
            item.brand = cleared(brand);
        }
        if let Some(competition) = self.competition {
            item.competition = cleared(competition);
        }
        if let Some(size) = self.size {
            item.size = Some(size);
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(budget) = self.max_budget {
            item.max_budget = Some(budget);
        }
        if let Some(notes) = self.notes {
            item.notes = cleared(notes);
        }
    }
}

async fn load_owned_item(state: &AppState, item_id: &str, user_id: &str) -> Result<WishlistItem> {
    let item = state
        .db
        .get_wishlist_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Wishlist item not found".to_string()))?;

    if item.user != user_id {
        tracing::warn!(item_id, user_id, "Wishlist access by non-owner");
        return Err(AppError::Forbidden(
            "Not authorized to access this wishlist item".to_string(),
        ));
    }

    Ok(item)
}

/// High priority first, then newest.
async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<WishlistItem>>>> {
    let mut items = state.db.list_wishlist_for_user(auth.id()).await?;
    items.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(ApiResponse::ok(items))
}

async fn get_item(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> Result<Json<ApiResponse<WishlistItem>>> {
    let item = load_owned_item(&state, &item_id, auth.id()).await?;
    Ok(ApiResponse::ok(item))
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<WishlistInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<WishlistItem>>)> {
    let input = json_body(body)?;

    let now = Utc::now();
    let mut item = WishlistItem {
        id: uuid::Uuid::new_v4().to_string(),
        user: auth.id().to_string(),
        team_name: String::new(),
        season: None,
        kind: WishlistType::default(),
        brand: None,
        competition: None,
        size: None,
        priority: Priority::default(),
        max_budget: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    input.apply(&mut item);
    item.validate()?;

    state.db.save_wishlist_item(&item).await?;
    tracing::info!(user_id = %auth.id(), item_id = %item.id, "Wishlist item created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(item, "Added to wishlist"),
    ))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(item_id): Path<String>,
    body: std::result::Result<Json<WishlistInput>, JsonRejection>,
) -> Result<Json<ApiResponse<WishlistItem>>> {
    let input = json_body(body)?;
    let mut item = load_owned_item(&state, &item_id, auth.id()).await?;

    input.apply(&mut item);
    item.updated_at = Utc::now();
    item.validate()?;

    state.db.save_wishlist_item(&item).await?;

    Ok(ApiResponse::with_message(item, "Wishlist item updated"))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let item = load_owned_item(&state, &item_id, auth.id()).await?;
    state.db.delete_wishlist_item(&item.id).await?;

    tracing::info!(user_id = %auth.id(), item_id = %item.id, "Wishlist item deleted");

    Ok(ApiResponse::message("Removed from wishlist"))
}

/// Turn a wishlist item into a shirt. The item supplies defaults; the
/// multipart form (same fields as shirt creation, plus 1-5 `images`)
/// overrides them. The item is deleted once the shirt is stored; the two
/// steps are not atomic.
async fn add_to_collection(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(item_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Shirt>>)> {
    let item = load_owned_item(&state, &item_id, auth.id()).await?;
    let form = MultipartForm::read(multipart, "images", MAX_SHIRT_IMAGES).await?;

    let mut shirt = blank_shirt(auth.id(), required_condition(&form)?);
    shirt.team_name = item.team_name.clone();
    shirt.season = item.season.clone().unwrap_or_default();
    shirt.kind = item.kind.as_shirt_type().unwrap_or_default();
    shirt.brand = item.brand.clone();
    shirt.competition = item.competition.clone();
    shirt.size = item.size;

    let shirt = insert_from_form(&state, shirt, &form).await?;

    if let Err(e) = state.db.delete_wishlist_item(&item.id).await {
        tracing::error!(
            item_id = %item.id,
            shirt_id = %shirt.id,
            error = %e,
            "Shirt created but wishlist item not removed"
        );
        return Err(e);
    }

    tracing::info!(
        user_id = %auth.id(),
        item_id = %item.id,
        shirt_id = %shirt.id,
        "Wishlist item moved to collection"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(shirt, "Added to collection"),
    ))
}
