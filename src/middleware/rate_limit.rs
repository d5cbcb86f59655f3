// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-IP rate limiting middleware.

use crate::error::AppError;
use crate::services::RateLimiter;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Client address: first `X-Forwarded-For` hop (the service runs behind a
/// load balancer), else the socket peer.
pub fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn enforce(
    state: &AppState,
    limiter: &RateLimiter,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.config.rate_limiting_enabled() {
        let key = client_key(&request);
        if !limiter.check(&key) {
            tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
            return Err(AppError::TooManyRequests);
        }
    }
    Ok(next.run(request).await)
}

/// General limit for all `/api` routes.
pub async fn limit_api(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &state.api_limiter, request, next).await
}

/// Stricter limit for login, register and Google sign-in.
pub async fn limit_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, &state.auth_limiter, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_peer() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&request), "192.0.2.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare), "unknown");
    }
}
