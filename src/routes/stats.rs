// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collection statistics routes.

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::stats::{GroupStat, Overview, TeamStat};
use crate::models::Shirt;
use crate::services::stats;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, MethodRouter},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Stats routes (require a complete profile; applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stats/overview", get(get_overview))
        .route("/api/stats/by-type", group_route(stats::by_type))
        .route("/api/stats/by-season", group_route(stats::by_season))
        .route("/api/stats/by-brand", group_route(stats::by_brand))
        .route("/api/stats/by-condition", group_route(stats::by_condition))
        .route("/api/stats/by-competition", group_route(stats::by_competition))
        .route("/api/stats/by-size", group_route(stats::by_size))
        .route("/api/stats/most-teams", get(get_most_teams))
        .route("/api/stats/recent", get(get_recent))
        .route("/api/stats/most-valuable", get(get_most_valuable))
        .route("/api/stats/export", get(get_export))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<String>,
}

async fn user_shirts(state: &AppState, auth: &AuthUser) -> Result<Vec<Shirt>> {
    state.db.list_shirts_for_user(auth.id()).await
}

async fn get_overview(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Overview>>> {
    let shirts = user_shirts(&state, &auth).await?;
    Ok(ApiResponse::ok(stats::overview(&shirts)))
}

type GroupReport = fn(&[Shirt]) -> Vec<GroupStat>;

/// GET route serving one group-by report over the requester's shirts.
fn group_route(report: GroupReport) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Extension(auth): Extension<AuthUser>| async move {
            let shirts = user_shirts(&state, &auth).await?;
            Ok::<_, AppError>(ApiResponse::ok(report(&shirts)))
        },
    )
}

async fn get_most_teams(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<TeamStat>>>> {
    let shirts = user_shirts(&state, &auth).await?;
    Ok(ApiResponse::ok(stats::most_teams(&shirts)))
}

async fn get_recent(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Shirt>>>> {
    let limit = stats::report_limit(query.limit.as_deref())?;
    let shirts = user_shirts(&state, &auth).await?;
    Ok(ApiResponse::ok(stats::recent(&shirts, limit)))
}

async fn get_most_valuable(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<Shirt>>>> {
    let limit = stats::report_limit(query.limit.as_deref())?;
    let shirts = user_shirts(&state, &auth).await?;
    Ok(ApiResponse::ok(stats::most_valuable(&shirts, limit)))
}

async fn get_export(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<Shirt>>>> {
    let shirts = user_shirts(&state, &auth).await?;
    tracing::info!(user_id = %auth.id(), count = shirts.len(), "Collection exported");
    Ok(ApiResponse::ok(stats::export(shirts)))
}
