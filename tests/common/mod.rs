// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use shirt_collector::config::{Config, DatabaseBackend};
use shirt_collector::db::Database;
use shirt_collector::routes::create_router;
use shirt_collector::services::{GoogleAuthVerifier, ImageStore};
use shirt_collector::AppState;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const TEST_GOOGLE_KID: &str = "test-google-kid";
const GOOGLE_PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/google_test_private.pem");
const GOOGLE_PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/google_test_public.pem");
const BOUNDARY: &str = "shirt-collector-test-boundary";

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Connect to the Firestore emulator.
pub async fn test_db() -> Database {
    let mut config = Config::test_default();
    config.database_backend = DatabaseBackend::Firestore;
    Database::connect(&config)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the memory database, the mock image store
/// and a Google verifier that trusts the fixture key.
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let google_key =
        DecodingKey::from_rsa_pem(GOOGLE_PUBLIC_PEM).expect("fixture public key should parse");
    let google = Arc::new(
        GoogleAuthVerifier::new_with_static_key(&config, TEST_GOOGLE_KID, google_key)
            .expect("static verifier"),
    );

    let state = Arc::new(AppState::new(
        config,
        Database::new_memory(),
        ImageStore::mock(),
        google,
    ));

    (create_router(state.clone()), state)
}

/// Create a session token the way the server does.
pub fn create_test_jwt(user_id: &str, signing_key: &[u8], lifetime_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        id: String,
        exp: i64,
        iat: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            id: user_id.to_string(),
            exp: now + lifetime_secs,
            iat: now,
        },
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Sign a Google-style ID token with the fixture private key.
pub fn google_id_token(sub: &str, email: &str, name: &str, audience: &str) -> String {
    #[derive(Serialize)]
    struct GoogleClaims<'a> {
        iss: &'a str,
        aud: &'a str,
        sub: &'a str,
        email: &'a str,
        email_verified: bool,
        name: &'a str,
        picture: &'a str,
        iat: u64,
        exp: u64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_GOOGLE_KID.to_string());

    encode(
        &header,
        &GoogleClaims {
            iss: "https://accounts.google.com",
            aud: audience,
            sub,
            email,
            email_verified: true,
            name,
            picture: "https://lh3.googleusercontent.com/a/test-picture",
            iat: now,
            exp: now + 3600,
        },
        &EncodingKey::from_rsa_pem(GOOGLE_PRIVATE_PEM).expect("fixture private key should parse"),
    )
    .unwrap()
}

/// Run one request and decode the JSON response (Null for empty bodies).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a multipart request with text fields and small fake JPEG files,
/// each file given as `(field name, file name)`.
pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    files: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

/// Register a local user; returns `(token, user_id)`.
pub async fn register_user(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/auth/register",
            None,
            json!({
                "name": format!("{} Fan", username),
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "hunter22"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["_id"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Create a shirt with one image plus the given extra fields; returns the
/// stored shirt JSON.
pub async fn create_shirt(
    app: &Router,
    token: &str,
    team: &str,
    season: &str,
    extra: &[(&str, &str)],
) -> Value {
    let mut fields = vec![("teamName", team), ("season", season), ("condition", "excellent")];
    fields.extend_from_slice(extra);

    let (status, body) = send(
        app,
        multipart_request(
            Method::POST,
            "/api/shirts",
            Some(token),
            &fields,
            &[("images", "front.jpg")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create shirt failed: {}", body);
    body["data"].clone()
}
