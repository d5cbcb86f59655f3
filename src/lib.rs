// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shirt Collector: catalogue a personal football-shirt collection
//!
//! This crate provides the backend API: accounts (password or Google
//! sign-in), shirts and wishlist records with hosted images, and
//! collection statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::{GoogleAuthVerifier, ImageStore, RateLimiter};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub images: ImageStore,
    pub google: Arc<GoogleAuthVerifier>,
    /// Limits all `/api` traffic per client
    pub api_limiter: RateLimiter,
    /// Stricter limit for credential endpoints
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        images: ImageStore,
        google: Arc<GoogleAuthVerifier>,
    ) -> Self {
        Self {
            config,
            db,
            images,
            google,
            api_limiter: RateLimiter::general(),
            auth_limiter: RateLimiter::auth(),
        }
    }
}
