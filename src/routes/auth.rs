// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: registration, login, Google sign-in and profile upkeep.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::form::MultipartForm;
use super::{json_body, ApiResponse};
use crate::db::UniqueKey;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::user::{normalize_username, validate_username, USERNAME_MIN_LEN};
use crate::models::{AuthProvider, PublicUser, User};
use crate::services::auth::{create_jwt, hash_password, verify_password};
use crate::services::images::AVATAR_FOLDER;
use crate::services::{GoogleAuthError, GoogleProfile};
use crate::AppState;

const DELETE_CONFIRMATION: &str = "DELETE";

/// Login, register and Google sign-in (rate limited more strictly).
pub fn credential_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google_sign_in))
}

/// Routes that need no token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/check-username/{username}", get(check_username))
}

/// Routes for the signed-in user; the profile need not be complete.
pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/set-username", put(set_username))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/auth/avatar", put(update_avatar))
        .route("/api/auth/change-password", put(change_password))
        .route("/api/auth/account", delete(delete_account))
}

/// Session token plus the user it belongs to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub user: PublicUser,
    /// Only set by Google sign-in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

fn issue_token(state: &AppState, user: &User) -> Result<String> {
    Ok(create_jwt(
        &user.id,
        &state.config.jwt_secret,
        state.config.jwt_expire_secs,
    )?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize and check a requested username.
fn checked_username(raw: &str) -> Result<String> {
    let username = normalize_username(raw);
    validate_username(&username).map_err(|e| {
        AppError::Validation(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid username".to_string()),
        )
    })?;
    Ok(username)
}

/// Fail if `username` belongs to someone other than `user_id`.
async fn ensure_username_free(state: &AppState, username: &str, user_id: Option<&str>) -> Result<()> {
    match state.db.find_user_by_username(username).await? {
        Some(existing) if Some(existing.id.as_str()) != user_id => Err(AppError::BadRequest(
            "Username is already taken".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Fail if `email` belongs to someone other than `user_id`.
async fn ensure_email_free(state: &AppState, email: &str, user_id: Option<&str>) -> Result<()> {
    match state.db.find_user_by_email(email).await? {
        Some(existing) if Some(existing.id.as_str()) != user_id => {
            Err(AppError::BadRequest("User already exists".to_string()))
        }
        _ => Ok(()),
    }
}

/// Email and username claims taken while handling one request.
///
/// Each is released again by [`PendingClaims::release`] when the request
/// fails before the user is saved.
#[derive(Default)]
struct PendingClaims {
    taken: Vec<(UniqueKey, String)>,
}

impl PendingClaims {
    async fn claim(
        &mut self,
        state: &AppState,
        key: UniqueKey,
        value: &str,
        user_id: &str,
        taken_message: &str,
    ) -> Result<()> {
        if !state.db.claim_key(key, value, user_id).await? {
            return Err(AppError::BadRequest(taken_message.to_string()));
        }
        self.taken.push((key, value.to_string()));
        Ok(())
    }

    async fn release(self, state: &AppState) {
        for (key, value) in self.taken {
            release_quietly(state, key, &value).await;
        }
    }
}

async fn release_quietly(state: &AppState, key: UniqueKey, value: &str) {
    if let Err(e) = state.db.release_key(key, value).await {
        tracing::warn!(?key, error = %e, "Failed to release claim");
    }
}

// ─── Register / Login ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Name is required (max 50 characters)"))]
    name: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let req = json_body(body)?;
    req.validate()?;

    let email = normalize_email(&req.email);
    let username = checked_username(&req.username)?;

    ensure_email_free(&state, &email, None).await?;
    ensure_username_free(&state, &username, None).await?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let mut claims = PendingClaims::default();
    let created: Result<User> = async {
        claims
            .claim(&state, UniqueKey::Email, &email, &user_id, "User already exists")
            .await?;
        claims
            .claim(&state, UniqueKey::Username, &username, &user_id, "Username is already taken")
            .await?;

        let now = Utc::now();
        let user = User {
            id: user_id.clone(),
            name: req.name.trim().to_string(),
            username: Some(username.clone()),
            email: email.clone(),
            password_hash: Some(hash_password(&req.password)?),
            avatar: None,
            avatar_public_id: None,
            auth_provider: AuthProvider::Local,
            google_id: None,
            is_profile_complete: true,
            created_at: now,
            updated_at: now,
        };
        state.db.save_user(&user).await?;
        Ok(user)
    }
    .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            claims.release(&state).await;
            return Err(e);
        }
    };

    tracing::info!(user_id = %user.id, "User registered");

    let payload = AuthPayload {
        token: issue_token(&state, &user)?,
        user: PublicUser::from(&user),
        is_new_user: None,
    };
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(payload, "Registration successful"),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthPayload>>> {
    let req = json_body(body)?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .db
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    // Google-only accounts have no password and get the same answer
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !verify_password(&req.password, hash) {
        tracing::info!(user_id = %user.id, "Failed login");
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok(AuthPayload {
        token: issue_token(&state, &user)?,
        user: PublicUser::from(&user),
        is_new_user: None,
    }))
}

// ─── Google Sign-In ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRequest {
    /// ID token or OAuth access token
    #[serde(default, alias = "accessToken", alias = "token")]
    credential: String,
}

async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<GoogleRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthPayload>>> {
    let req = json_body(body)?;
    if req.credential.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Google credential is required".to_string(),
        ));
    }

    let profile = state
        .google
        .authenticate(&req.credential)
        .await
        .map_err(|e| match e {
            GoogleAuthError::Invalid(msg) => {
                tracing::info!(reason = %msg, "Google credential rejected");
                AppError::Unauthorized("Google authentication failed".to_string())
            }
            GoogleAuthError::Transient(msg) => AppError::ExternalService(msg),
        })?;

    let (user, is_new_user) = find_or_create_google_user(&state, profile).await?;

    Ok(ApiResponse::ok(AuthPayload {
        token: issue_token(&state, &user)?,
        user: PublicUser::from(&user),
        is_new_user: Some(is_new_user),
    }))
}

/// Match by Google id, then link by email, else create a user who still
/// has to pick a username.
async fn find_or_create_google_user(state: &AppState, profile: GoogleProfile) -> Result<(User, bool)> {
    if let Some(user) = state.db.find_user_by_google_id(&profile.google_id).await? {
        tracing::info!(user_id = %user.id, "Google sign-in");
        return Ok((user, false));
    }

    if let Some(user) = state.db.find_user_by_email(&profile.email).await? {
        return link_google_account(state, user, profile).await;
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    if !state
        .db
        .claim_key(UniqueKey::Email, &profile.email, &user_id)
        .await?
    {
        // Lost a race with another sign-up for this email
        return match state.db.find_user_by_email(&profile.email).await? {
            Some(user) => link_google_account(state, user, profile).await,
            None => Err(AppError::BadRequest("User already exists".to_string())),
        };
    }

    let name = profile
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| {
            profile
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    let now = Utc::now();
    let user = User {
        id: user_id,
        name,
        username: None,
        email: profile.email,
        password_hash: None,
        avatar: profile.picture,
        avatar_public_id: None,
        auth_provider: AuthProvider::Google,
        google_id: Some(profile.google_id),
        is_profile_complete: false,
        created_at: now,
        updated_at: now,
    };
    if let Err(e) = state.db.save_user(&user).await {
        release_quietly(state, UniqueKey::Email, &user.email).await;
        return Err(e);
    }

    tracing::info!(user_id = %user.id, "Created user from Google sign-in");
    Ok((user, true))
}

/// Attach a Google subject to the account registered with its email.
/// An account already linked to another subject is never re-linked.
async fn link_google_account(
    state: &AppState,
    mut user: User,
    profile: GoogleProfile,
) -> Result<(User, bool)> {
    match user.google_id.as_deref() {
        Some(linked) if linked == profile.google_id => return Ok((user, false)),
        Some(_) => {
            tracing::warn!(
                user_id = %user.id,
                "Google sign-in for an email linked to a different Google account"
            );
            return Err(AppError::Forbidden(
                "This email is linked to a different Google account".to_string(),
            ));
        }
        None => {}
    }

    user.google_id = Some(profile.google_id);
    if user.avatar.is_none() {
        user.avatar = profile.picture;
    }
    user.updated_at = Utc::now();
    state.db.save_user(&user).await?;
    tracing::info!(user_id = %user.id, "Linked Google account to existing user");
    Ok((user, false))
}

// ─── Username ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UsernameAvailability {
    pub success: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

async fn check_username(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let username = normalize_username(&raw);

    if username.chars().count() < USERNAME_MIN_LEN {
        let body = UsernameAvailability {
            success: false,
            available: false,
            message: Some(format!(
                "Username must be at least {} characters",
                USERNAME_MIN_LEN
            )),
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let body = match validate_username(&username) {
        Err(e) => UsernameAvailability {
            success: true,
            available: false,
            message: e.message.map(|m| m.to_string()),
        },
        Ok(()) => {
            let taken = state.db.find_user_by_username(&username).await?.is_some();
            UsernameAvailability {
                success: true,
                available: !taken,
                message: taken.then(|| "Username is already taken".to_string()),
            }
        }
    };

    Ok(Json(body).into_response())
}

#[derive(Debug, Deserialize)]
struct SetUsernameRequest {
    #[serde(default)]
    username: String,
}

/// Choose a username; completes the profile of Google users.
async fn set_username(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<SetUsernameRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PublicUser>>> {
    let req = json_body(body)?;
    let username = checked_username(&req.username)?;
    ensure_username_free(&state, &username, Some(auth.id())).await?;

    let mut user = auth.user;
    let mut claims = PendingClaims::default();
    let mut replaced = Vec::new();
    if user.username.as_deref() != Some(username.as_str()) {
        claims
            .claim(&state, UniqueKey::Username, &username, &user.id, "Username is already taken")
            .await?;
        if let Some(old) = user.username.replace(username) {
            replaced.push((UniqueKey::Username, old));
        }
    }

    user.is_profile_complete = true;
    user.updated_at = Utc::now();
    save_with_claims(&state, &user, claims, replaced).await?;

    tracing::info!(user_id = %user.id, "Username set");

    Ok(ApiResponse::with_message(
        PublicUser::from(&user),
        "Username set successfully",
    ))
}

/// Save `user` after taking `claims`. On success the replaced values are
/// freed; on failure the new claims are.
async fn save_with_claims(
    state: &AppState,
    user: &User,
    claims: PendingClaims,
    replaced: Vec<(UniqueKey, String)>,
) -> Result<()> {
    if let Err(e) = state.db.save_user(user).await {
        claims.release(state).await;
        return Err(e);
    }
    for (key, value) in replaced {
        release_quietly(state, key, &value).await;
    }
    Ok(())
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_me(Extension(auth): Extension<AuthUser>) -> Json<ApiResponse<PublicUser>> {
    ApiResponse::ok(PublicUser::from(&auth.user))
}

#[derive(Debug, Deserialize, Validate)]
struct ProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Name is required (max 50 characters)"))]
    name: Option<String>,
    username: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    email: Option<String>,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PublicUser>>> {
    let req = json_body(body)?;
    req.validate()?;

    let mut user = auth.user;
    let mut claims = PendingClaims::default();
    let mut replaced: Vec<(UniqueKey, String)> = Vec::new();

    let changed: Result<()> = async {
        if let Some(name) = req.name {
            user.name = name.trim().to_string();
        }

        if let Some(raw) = req.username {
            let username = checked_username(&raw)?;
            if user.username.as_deref() != Some(username.as_str()) {
                ensure_username_free(&state, &username, Some(&user.id)).await?;
                claims
                    .claim(&state, UniqueKey::Username, &username, &user.id, "Username is already taken")
                    .await?;
                if let Some(old) = user.username.replace(username) {
                    replaced.push((UniqueKey::Username, old));
                }
            }
            user.is_profile_complete = true;
        }

        if let Some(raw) = req.email {
            let email = normalize_email(&raw);
            if email != user.email {
                const IN_USE: &str = "Email is already in use";
                ensure_email_free(&state, &email, Some(&user.id))
                    .await
                    .map_err(|e| match e {
                        AppError::BadRequest(_) => AppError::BadRequest(IN_USE.to_string()),
                        other => other,
                    })?;
                claims
                    .claim(&state, UniqueKey::Email, &email, &user.id, IN_USE)
                    .await?;
                replaced.push((UniqueKey::Email, std::mem::replace(&mut user.email, email)));
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = changed {
        claims.release(&state).await;
        return Err(e);
    }

    user.updated_at = Utc::now();
    save_with_claims(&state, &user, claims, replaced).await?;

    Ok(ApiResponse::with_message(
        PublicUser::from(&user),
        "Profile updated successfully",
    ))
}

/// Replace the avatar with the uploaded `avatar` file.
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PublicUser>>> {
    let form = MultipartForm::read(multipart, "avatar", 1).await?;
    let file = form
        .files
        .first()
        .ok_or_else(|| AppError::BadRequest("Please upload an image".to_string()))?;

    let uploaded = state.images.upload(file, AVATAR_FOLDER).await?;

    let mut user = auth.user;
    let old_public_id = user.avatar_public_id.take().or_else(|| {
        user.avatar
            .as_deref()
            .and_then(crate::models::image::public_id_from_url)
    });

    user.avatar = Some(uploaded.url);
    user.avatar_public_id = uploaded.public_id;
    user.updated_at = Utc::now();
    if let Err(e) = state.db.save_user(&user).await {
        if let Some(fresh) = user.avatar_public_id.take() {
            state.images.destroy_ids(&[fresh]).await;
        }
        return Err(e);
    }

    if let Some(old) = old_public_id {
        state.images.destroy_ids(&[old]).await;
    }

    tracing::info!(user_id = %user.id, "Avatar updated");

    Ok(ApiResponse::with_message(
        PublicUser::from(&user),
        "Avatar updated successfully",
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    new_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>> {
    let req = json_body(body)?;

    let mut user = auth.user;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest(
            "Google accounts do not have a password to change".to_string(),
        ));
    };

    req.validate()?;

    if !verify_password(&req.current_password, hash) {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    user.password_hash = Some(hash_password(&req.new_password)?);
    user.updated_at = Utc::now();
    state.db.save_user(&user).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::message("Password changed successfully"))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct DeleteAccountRequest {
    #[serde(default)]
    password: Option<String>,
    /// Google accounts confirm by typing `DELETE`
    #[serde(default)]
    confirmation: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub deleted_shirts: usize,
    pub deleted_wishlist_items: usize,
}

/// Delete the account, its shirts (with images), wishlist and avatar.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DeletedAccount>>> {
    // An empty body is a missing confirmation, not malformed JSON
    let req = match body {
        Err(JsonRejection::MissingJsonContentType(_)) => DeleteAccountRequest::default(),
        other => json_body(other)?,
    };
    let user = auth.user;

    match user.password_hash.as_deref() {
        Some(hash) => {
            let password = req.password.as_deref().unwrap_or_default();
            if password.is_empty() {
                return Err(AppError::BadRequest(
                    "Password is required to delete your account".to_string(),
                ));
            }
            if !verify_password(password, hash) {
                return Err(AppError::Unauthorized("Incorrect password".to_string()));
            }
        }
        None => {
            if req.confirmation.as_deref() != Some(DELETE_CONFIRMATION) {
                return Err(AppError::BadRequest(format!(
                    "Type {} to confirm account deletion",
                    DELETE_CONFIRMATION
                )));
            }
        }
    }

    tracing::info!(user_id = %user.id, "User-initiated account deletion");

    // Release hosted images first; shirts one at a time, each shirt's
    // images concurrently.
    let shirts = state.db.list_shirts_for_user(&user.id).await?;
    for shirt in &shirts {
        state.images.destroy_images(&shirt.images).await;
    }
    if let Some(avatar_id) = user.avatar_public_id.clone().or_else(|| {
        user.avatar
            .as_deref()
            .and_then(crate::models::image::public_id_from_url)
    }) {
        state.images.destroy_ids(&[avatar_id]).await;
    }

    let deleted = state.db.delete_user_data(&user.id).await?;

    Ok(ApiResponse::with_message(
        DeletedAccount {
            deleted_shirts: deleted.shirts,
            deleted_wishlist_items: deleted.wishlist_items,
        },
        "Account deleted successfully",
    ))
}
