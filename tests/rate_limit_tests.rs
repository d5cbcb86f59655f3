// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rate limiting through the full router: the strict credential limit, the
//! general `/api` limit, and the test-environment bypass.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::json;
use shirt_collector::config::Config;

mod common;

use common::{create_test_app, create_test_app_with_config, send};

fn production_config() -> Config {
    let mut config = Config::test_default();
    config.environment = "production".to_string();
    config
}

fn login_from(ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            json!({"email": "nobody@example.com", "password": "guess-again"}).to_string(),
        ))
        .unwrap()
}

fn check_username_from(ip: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/auth/check-username/some_name")
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

async fn login_statuses(app: &Router, ip: &str, attempts: usize) -> Vec<StatusCode> {
    let mut statuses = Vec::with_capacity(attempts);
    for _ in 0..attempts {
        let (status, _) = send(app, login_from(ip)).await;
        statuses.push(status);
    }
    statuses
}

#[tokio::test]
async fn test_credential_endpoints_allow_ten_per_window() {
    let (app, _) = create_test_app_with_config(production_config());

    let statuses = login_statuses(&app, "198.51.100.10", 10).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::UNAUTHORIZED), "{:?}", statuses);

    let (status, body) = send(&app, login_from("198.51.100.10")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());

    // Registration shares the credential budget
    let (status, _) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "198.51.100.10")
            .body(Body::from("{}"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Other clients and other endpoints are unaffected
    let (status, _) = send(&app, login_from("198.51.100.11")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, check_username_from("198.51.100.10")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_api_allows_one_hundred_per_window() {
    let (app, _) = create_test_app_with_config(production_config());

    for n in 0..100 {
        let (status, _) = send(&app, check_username_from("203.0.113.5")).await;
        assert_eq!(status, StatusCode::OK, "request {}", n + 1);
    }

    let (status, body) = send(&app, check_username_from("203.0.113.5")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);

    // Health checks sit outside /api
    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "203.0.113.5")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_no_limits_in_test_environment() {
    let (app, _) = create_test_app();

    let statuses = login_statuses(&app, "198.51.100.20", 25).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::UNAUTHORIZED), "{:?}", statuses);
}
