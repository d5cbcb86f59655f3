// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod google_auth;
pub mod images;
pub mod rate_limit;
pub mod shirt_filter;
pub mod stats;

pub use google_auth::{GoogleAuthError, GoogleAuthVerifier, GoogleProfile};
pub use images::{ImageStore, UploadedFile};
pub use rate_limit::RateLimiter;
pub use shirt_filter::{Pagination, ShirtListParams, ShirtQuery};
