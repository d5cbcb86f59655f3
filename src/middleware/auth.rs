// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::services::auth::verify_jwt;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user loaded from the session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// Middleware that requires a valid bearer token for an existing user.
pub async fn protect(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let claims = verify_jwt(token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::Unauthorized("Not authorized, token failed".to_string())
    })?;

    let user = state.db.get_user(&claims.id).await?.ok_or_else(|| {
        tracing::info!(user_id = %claims.id, "Token for missing user");
        AppError::Unauthorized("Not authorized, user not found".to_string())
    })?;

    request.extensions_mut().insert(AuthUser { user });

    Ok(next.run(request).await)
}

/// Reject users who still need to choose a username. Must run after
/// [`protect`].
pub async fn require_complete_profile(request: Request, next: Next) -> Result<Response, AppError> {
    let complete = request
        .extensions()
        .get::<AuthUser>()
        .map(|auth| auth.user.is_profile_complete)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    if !complete {
        return Err(AppError::Forbidden(
            "Please complete your profile by choosing a username".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
