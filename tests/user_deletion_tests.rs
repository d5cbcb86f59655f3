// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Integration tests for account deletion.
//!
//! Deleting an account removes the user's shirts, their hosted images, the
//! wishlist and the avatar, and leaves other users alone.

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;

use common::{
    create_shirt, create_test_app, empty_request, json_request, multipart_request, register_user,
    send,
};

#[tokio::test]
async fn test_delete_account_cascades() {
    let (app, state) = create_test_app();
    let (token, user_id) = register_user(&app, "leaver").await;
    let (other_token, other_id) = register_user(&app, "stayer").await;

    create_shirt(&app, &token, "Parma", "1998/99", &[]).await;
    create_shirt(&app, &token, "Lazio", "1999/00", &[]).await;
    let kept = create_shirt(&app, &other_token, "Roma", "2000/01", &[]).await;

    for team in ["Bari", "Lecce"] {
        let (status, _) = send(
            &app,
            json_request(Method::POST, "/api/wishlist", Some(&token), json!({"teamName": team})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        &app,
        multipart_request(Method::PUT, "/api/auth/avatar", Some(&token), &[], &[("avatar", "me.jpg")]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.images.mock_asset_count(), 4);

    let (status, body) = send(
        &app,
        json_request(
            Method::DELETE,
            "/api/auth/account",
            Some(&token),
            json!({"password": "hunter22"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["deletedShirts"], 2);
    assert_eq!(body["data"]["deletedWishlistItems"], 2);

    // Only the other user's image is left
    assert_eq!(state.images.mock_asset_count(), 1);

    assert!(state.db.get_user(&user_id).await.unwrap().is_none());
    assert!(state.db.list_shirts_for_user(&user_id).await.unwrap().is_empty());
    assert!(state.db.list_wishlist_for_user(&user_id).await.unwrap().is_empty());

    assert!(state.db.get_user(&other_id).await.unwrap().is_some());
    let kept_id = kept["_id"].as_str().unwrap();
    assert!(state.db.get_shirt(kept_id).await.unwrap().is_some());

    // The email and username are free again
    let (status, body) = send(&app, empty_request(Method::GET, "/api/auth/check-username/leaver", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    register_user(&app, "leaver").await;
}

#[tokio::test]
async fn test_delete_account_requires_password() {
    let (app, state) = create_test_app();
    let (token, user_id) = register_user(&app, "careful").await;
    create_shirt(&app, &token, "Hull City", "1992/93", &[]).await;

    let (status, body) = send(
        &app,
        json_request(
            Method::DELETE,
            "/api/auth/account",
            Some(&token),
            json!({"password": "not-my-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Incorrect password");

    // A bare DELETE without a body is a missing password
    let (status, _) = send(&app, empty_request(Method::DELETE, "/api/auth/account", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(state.db.get_user(&user_id).await.unwrap().is_some());
    assert_eq!(state.db.list_shirts_for_user(&user_id).await.unwrap().len(), 1);
    assert_eq!(state.images.mock_asset_count(), 1);
}

#[tokio::test]
async fn test_store_level_deletion_counts() {
    let (app, state) = create_test_app();
    let (token, user_id) = register_user(&app, "direct").await;
    create_shirt(&app, &token, "Leeds", "1991/92", &[]).await;

    let deleted = state.db.delete_user_data(&user_id).await.unwrap();
    assert_eq!(deleted.shirts, 1);
    assert_eq!(deleted.wishlist_items, 0);

    // Deleting again is a no-op
    let again = state.db.delete_user_data(&user_id).await.unwrap();
    assert_eq!(again.shirts, 0);
}
