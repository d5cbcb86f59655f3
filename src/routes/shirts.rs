// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shirt collection routes.

use super::form::MultipartForm;
use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::shirt::MAX_SHIRT_IMAGES;
use crate::models::{Condition, Shirt, ShirtType, StoredImage};
use crate::services::images::SHIRT_FOLDER;
use crate::services::ImageStore;
use crate::services::shirt_filter::{filter_options, FilterOptions};
use crate::services::{ShirtListParams, ShirtQuery};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use validator::Validate;

/// Shirt routes (require a complete profile; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/shirts", get(list_shirts).post(create_shirt))
        .route("/api/shirts/filters/options", get(get_filter_options))
        .route(
            "/api/shirts/{id}",
            get(get_shirt).put(update_shirt).delete(delete_shirt),
        )
        .route("/api/shirts/{id}/favorite", patch(toggle_favorite))
}

/// Load a shirt and check that the requester owns it.
async fn load_owned_shirt(state: &AppState, shirt_id: &str, user_id: &str) -> Result<Shirt> {
    let shirt = state
        .db
        .get_shirt(shirt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shirt not found".to_string()))?;

    if shirt.user != user_id {
        tracing::warn!(shirt_id, user_id, "Shirt access by non-owner");
        return Err(AppError::Forbidden(
            "Not authorized to access this shirt".to_string(),
        ));
    }

    Ok(shirt)
}

/// Copy the fields present in the form onto a shirt. Fields that were sent
/// empty clear optional values; absent fields are left alone.
fn apply_form(shirt: &mut Shirt, form: &MultipartForm) -> Result<()> {
    if form.has("teamName") {
        shirt.team_name = form.text("teamName").unwrap_or_default();
    }
    if form.has("season") {
        shirt.season = form.text("season").unwrap_or_default();
    }
    if form.has("type") {
        shirt.kind = form.parse::<ShirtType>("type")?.unwrap_or_default();
    }
    if let Some(condition) = form.parse::<Condition>("condition")? {
        shirt.condition = condition;
    }
    if form.has("size") {
        shirt.size = form.parse("size")?;
    }
    if form.has("color") {
        shirt.color = form.parse("color")?;
    }
    if form.has("playerNumber") {
        shirt.player_number = form.parse("playerNumber")?;
    }
    if form.has("purchaseDate") {
        shirt.purchase_date = form.date("purchaseDate")?;
    }
    if form.has("purchasePrice") {
        shirt.purchase_price = form.number("purchasePrice")?;
    }
    if form.has("currentValue") {
        shirt.current_value = form.number("currentValue")?;
    }

    for (name, slot) in [
        ("brand", &mut shirt.brand),
        ("playerName", &mut shirt.player_name),
        ("competition", &mut shirt.competition),
        ("purchaseLocation", &mut shirt.purchase_location),
        ("notes", &mut shirt.notes),
    ] {
        if form.has(name) {
            *slot = form.text(name);
        }
    }

    for (name, slot) in [
        ("signed", &mut shirt.signed),
        ("matchWorn", &mut shirt.match_worn),
        ("playerIssue", &mut shirt.player_issue),
        ("isFavorite", &mut shirt.is_favorite),
    ] {
        if form.has(name) {
            *slot = form.flag(name);
        }
    }

    Ok(())
}

/// List the requester's shirts with filters, sort and pagination.
async fn list_shirts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<ShirtListParams>,
) -> Result<Json<ApiResponse<Vec<Shirt>>>> {
    let query = ShirtQuery::from_params(&params)?;
    let shirts = state.db.list_shirts_for_user(auth.id()).await?;
    let (page, pagination) = query.apply(shirts);

    tracing::debug!(
        user_id = %auth.id(),
        returned = page.len(),
        total = pagination.total_shirts,
        "Listed shirts"
    );

    Ok(ApiResponse::paginated(page, pagination))
}

async fn get_shirt(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(shirt_id): Path<String>,
) -> Result<Json<ApiResponse<Shirt>>> {
    let shirt = load_owned_shirt(&state, &shirt_id, auth.id()).await?;
    Ok(ApiResponse::ok(shirt))
}

/// The condition a new shirt must be given.
pub(crate) fn required_condition(form: &MultipartForm) -> Result<Condition> {
    form.parse::<Condition>("condition")?
        .ok_or_else(|| AppError::Validation("Condition is required".to_string()))
}

/// An empty shirt owned by `user_id`, to be filled from a form.
pub(crate) fn blank_shirt(user_id: &str, condition: Condition) -> Shirt {
    let now = Utc::now();
    Shirt {
        id: uuid::Uuid::new_v4().to_string(),
        user: user_id.to_string(),
        team_name: String::new(),
        season: String::new(),
        kind: ShirtType::default(),
        brand: None,
        size: None,
        condition,
        player_name: None,
        player_number: None,
        competition: None,
        signed: false,
        match_worn: false,
        player_issue: false,
        color: None,
        images: Vec::new(),
        purchase_date: None,
        purchase_price: None,
        current_value: None,
        purchase_location: None,
        notes: None,
        is_favorite: false,
        created_at: now,
        updated_at: now,
    }
}

/// Apply the form, upload its images and store the new shirt.
pub(crate) async fn insert_from_form(
    state: &AppState,
    mut shirt: Shirt,
    form: &MultipartForm,
) -> Result<Shirt> {
    apply_form(&mut shirt, form)?;

    // Validate before uploading so bad input leaves no orphaned images
    shirt.validate()?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest(
            "Please upload at least one image".to_string(),
        ));
    }

    shirt.images = state.images.upload_all(&form.files, SHIRT_FOLDER).await?;

    if let Err(e) = state.db.save_shirt(&shirt).await {
        state.images.destroy_images(&shirt.images).await;
        return Err(e);
    }

    tracing::info!(
        user_id = %shirt.user,
        shirt_id = %shirt.id,
        images = shirt.images.len(),
        "Shirt created"
    );

    Ok(shirt)
}

/// Create a shirt from a multipart form with 1-5 `images`.
async fn create_shirt(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Shirt>>)> {
    let form = MultipartForm::read(multipart, "images", MAX_SHIRT_IMAGES).await?;
    let shirt = blank_shirt(auth.id(), required_condition(&form)?);
    let shirt = insert_from_form(&state, shirt, &form).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(shirt, "Shirt added to collection"),
    ))
}

/// Update a shirt. New `images`, if any, replace the old set wholesale.
async fn update_shirt(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(shirt_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Shirt>>> {
    let mut shirt = load_owned_shirt(&state, &shirt_id, auth.id()).await?;
    let form = MultipartForm::read(multipart, "images", MAX_SHIRT_IMAGES).await?;

    apply_form(&mut shirt, &form)?;
    shirt.updated_at = Utc::now();
    shirt.validate()?;

    if form.files.is_empty() {
        state.db.save_shirt(&shirt).await?;
    } else {
        let new_images = state.images.upload_all(&form.files, SHIRT_FOLDER).await?;
        let db = state.db.clone();
        replace_images(&state.images, &mut shirt, new_images, |updated| async move {
            db.save_shirt(&updated).await
        })
        .await?;
    }

    tracing::info!(user_id = %auth.id(), shirt_id = %shirt.id, "Shirt updated");

    Ok(ApiResponse::with_message(shirt, "Shirt updated successfully"))
}

/// Swap in freshly uploaded images and persist the shirt with `save`.
///
/// The old images are destroyed only once the save succeeded. If it
/// failed, the new uploads are destroyed and the shirt keeps its old set.
async fn replace_images<F, Fut>(
    images: &ImageStore,
    shirt: &mut Shirt,
    new_images: Vec<StoredImage>,
    save: F,
) -> Result<()>
where
    F: FnOnce(Shirt) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let old_images = std::mem::replace(&mut shirt.images, new_images);

    if let Err(e) = save(shirt.clone()).await {
        let unsaved = std::mem::replace(&mut shirt.images, old_images);
        images.destroy_images(&unsaved).await;
        return Err(e);
    }

    images.destroy_images(&old_images).await;
    tracing::debug!(
        shirt_id = %shirt.id,
        removed = old_images.len(),
        added = shirt.images.len(),
        "Replaced shirt images"
    );
    Ok(())
}

/// Delete a shirt and its hosted images.
async fn delete_shirt(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(shirt_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let shirt = load_owned_shirt(&state, &shirt_id, auth.id()).await?;

    state.images.destroy_images(&shirt.images).await;
    state.db.delete_shirt(&shirt.id).await?;

    tracing::info!(user_id = %auth.id(), shirt_id = %shirt.id, "Shirt deleted");

    Ok(ApiResponse::message("Shirt deleted successfully"))
}

/// Flip `isFavorite`. Concurrent toggles are last-write-wins.
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(shirt_id): Path<String>,
) -> Result<Json<ApiResponse<Shirt>>> {
    let mut shirt = load_owned_shirt(&state, &shirt_id, auth.id()).await?;

    shirt.is_favorite = !shirt.is_favorite;
    shirt.updated_at = Utc::now();
    state.db.save_shirt(&shirt).await?;

    let message = if shirt.is_favorite {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    Ok(ApiResponse::with_message(shirt, message))
}

async fn get_filter_options(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<FilterOptions>>> {
    let shirts = state.db.list_shirts_for_user(auth.id()).await?;
    Ok(ApiResponse::ok(filter_options(&shirts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::images::UploadedFile;

    fn jpeg(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff, 0xe0],
        }
    }

    async fn shirt_with_image(images: &ImageStore) -> Shirt {
        let mut shirt = blank_shirt("u1", Condition::Good);
        shirt.images = vec![images.upload(&jpeg("old.jpg"), SHIRT_FOLDER).await.unwrap()];
        shirt
    }

    #[tokio::test]
    async fn test_replace_images_destroys_old_set_after_save() {
        let images = ImageStore::mock();
        let mut shirt = shirt_with_image(&images).await;
        let fresh = images.upload_all(&[jpeg("a.jpg"), jpeg("b.jpg")], SHIRT_FOLDER).await.unwrap();
        assert_eq!(images.mock_asset_count(), 3);

        replace_images(&images, &mut shirt, fresh.clone(), |_| async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(shirt.images, fresh);
        assert_eq!(images.mock_asset_count(), 2);
    }

    #[tokio::test]
    async fn test_replace_images_keeps_old_set_when_save_fails() {
        let images = ImageStore::mock();
        let mut shirt = shirt_with_image(&images).await;
        let old = shirt.images.clone();
        let fresh = images.upload_all(&[jpeg("a.jpg")], SHIRT_FOLDER).await.unwrap();

        let result = replace_images(&images, &mut shirt, fresh, |_| async {
            Err(AppError::Database("unavailable".to_string()))
        })
        .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(shirt.images, old);
        // Only the still-referenced original remains
        assert_eq!(images.mock_asset_count(), 1);
    }
}
