// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
mod form;
pub mod shirts;
pub mod stats;
pub mod wishlist;

use crate::error::AppError;
use crate::middleware::auth::{protect, require_complete_profile};
use crate::middleware::rate_limit::{limit_api, limit_auth};
use crate::services::Pagination;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Request body cap: five 5 MiB images plus form fields.
const MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Standard response envelope.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            pagination: None,
        })
    }

    pub fn paginated(data: T, pagination: Pagination) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(pagination),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
        })
    }
}

/// Unwrap a JSON body, reporting malformed input as 400.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: String,
}

/// Liveness check; does not touch the database.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// One entry of the machine-readable route index.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    /// `public`, `token` or `complete-profile`
    pub auth: &'static str,
    pub description: &'static str,
}

const fn doc(
    method: &'static str,
    path: &'static str,
    auth: &'static str,
    description: &'static str,
) -> RouteDoc {
    RouteDoc {
        method,
        path,
        auth,
        description,
    }
}

pub const ROUTE_INDEX: &[RouteDoc] = &[
    doc("GET", "/health", "public", "Liveness check"),
    doc("POST", "/api/auth/register", "public", "Create a local account"),
    doc("POST", "/api/auth/login", "public", "Log in with email and password"),
    doc("POST", "/api/auth/google", "public", "Sign in with a Google credential"),
    doc("GET", "/api/auth/check-username/{username}", "public", "Username availability"),
    doc("GET", "/api/auth/me", "token", "Current user"),
    doc("PUT", "/api/auth/set-username", "token", "Choose a username and complete the profile"),
    doc("PUT", "/api/auth/profile", "token", "Update name, username or email"),
    doc("PUT", "/api/auth/avatar", "token", "Replace the avatar (multipart field `avatar`)"),
    doc("PUT", "/api/auth/change-password", "token", "Change or verify the password"),
    doc("DELETE", "/api/auth/account", "token", "Delete the account and all data"),
    doc("GET", "/api/shirts", "complete-profile", "List shirts with filters and pagination"),
    doc("POST", "/api/shirts", "complete-profile", "Create a shirt (multipart, 1-5 `images`)"),
    doc("GET", "/api/shirts/filters/options", "complete-profile", "Values for filter dropdowns"),
    doc("GET", "/api/shirts/{id}", "complete-profile", "Get one shirt"),
    doc("PUT", "/api/shirts/{id}", "complete-profile", "Update a shirt (multipart)"),
    doc("DELETE", "/api/shirts/{id}", "complete-profile", "Delete a shirt and its images"),
    doc("PATCH", "/api/shirts/{id}/favorite", "complete-profile", "Toggle favorite"),
    doc("GET", "/api/wishlist", "complete-profile", "List wishlist items"),
    doc("POST", "/api/wishlist", "complete-profile", "Create a wishlist item"),
    doc("GET", "/api/wishlist/{id}", "complete-profile", "Get one wishlist item"),
    doc("PUT", "/api/wishlist/{id}", "complete-profile", "Update a wishlist item"),
    doc("DELETE", "/api/wishlist/{id}", "complete-profile", "Delete a wishlist item"),
    doc("POST", "/api/wishlist/{id}/add-to-collection", "complete-profile", "Move a wishlist item into the collection"),
    doc("GET", "/api/stats/overview", "complete-profile", "Collection totals"),
    doc("GET", "/api/stats/by-type", "complete-profile", "Counts by kit type"),
    doc("GET", "/api/stats/by-season", "complete-profile", "Counts by season"),
    doc("GET", "/api/stats/by-brand", "complete-profile", "Top brands"),
    doc("GET", "/api/stats/by-condition", "complete-profile", "Counts by condition"),
    doc("GET", "/api/stats/by-competition", "complete-profile", "Counts by competition"),
    doc("GET", "/api/stats/by-size", "complete-profile", "Counts by size"),
    doc("GET", "/api/stats/most-teams", "complete-profile", "Teams with the most shirts"),
    doc("GET", "/api/stats/recent", "complete-profile", "Recently added shirts"),
    doc("GET", "/api/stats/most-valuable", "complete-profile", "Most valuable shirts"),
    doc("GET", "/api/stats/export", "complete-profile", "Every shirt for export"),
];

#[derive(Serialize)]
struct ApiIndex {
    success: bool,
    name: &'static str,
    version: &'static str,
    routes: &'static [RouteDoc],
}

async fn api_index() -> Json<ApiIndex> {
    Json(ApiIndex {
        success: true,
        name: "Shirt Collector API",
        version: env!("CARGO_PKG_VERSION"),
        routes: ROUTE_INDEX,
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            message: Some("Route not found".to_string()),
            pagination: None,
        }),
    )
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let client_url = state.config.client_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == client_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Credential endpoints get the stricter limiter
    let credential_routes = auth::credential_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_auth));

    // Account routes only need a valid token
    let account_routes =
        auth::account_routes().route_layer(middleware::from_fn_with_state(state.clone(), protect));

    // Collection routes also need a chosen username
    let collection_routes = shirts::routes()
        .merge(wishlist::routes())
        .merge(stats::routes())
        .route_layer(middleware::from_fn(require_complete_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    let api_routes = Router::new()
        .merge(credential_routes)
        .merge(auth::public_routes())
        .merge(account_routes)
        .merge(collection_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_api));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(api_index))
        .route("/api-docs", get(api_index))
        .merge(api_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
