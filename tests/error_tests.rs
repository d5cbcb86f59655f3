// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use shirt_collector::error::AppError;
use tower::ServiceExt;

mod common;

use common::{create_test_app, empty_request, register_user, send};

#[test]
fn test_store_errors_are_generic_to_clients() {
    let err = AppError::Database("deadline exceeded on projects/x/documents".to_string());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.client_message(), "Server error");

    let err = AppError::Internal(anyhow::anyhow!("disk on fire"));
    assert_eq!(err.client_message(), "Server error");
}

#[test]
fn test_client_errors_keep_their_message() {
    let err = AppError::NotFound("Shirt not found".to_string());
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.client_message(), "Shirt not found");

    let err = AppError::ExternalService("cloudinary said 500".to_string());
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert_ne!(err.client_message(), "cloudinary said 500");
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app();
    let (status, body) = send(&app, empty_request(Method::GET, "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = create_test_app();

    for uri in ["/nope", "/api/jerseys", "/api/auth/unknown"] {
        let (status, body) = send(&app, empty_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
    }
}

#[tokio::test]
async fn test_route_index() {
    let (app, _) = create_test_app();

    for uri in ["/", "/api-docs"] {
        let (status, body) = send(&app, empty_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        let routes = body["routes"].as_array().unwrap();
        assert!(routes
            .iter()
            .any(|r| r["path"] == "/api/shirts/{id}/favorite" && r["method"] == "PATCH"));
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = create_test_app();
    let (token, _) = register_user(&app, "json_fan").await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/wishlist")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"teamName\": "))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let (app, _) = create_test_app();

    for uri in ["/health", "/missing"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("strict-transport-security"));
    }
}
