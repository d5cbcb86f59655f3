// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod image;
pub mod shirt;
pub mod stats;
pub mod user;
pub mod wishlist;

pub use image::StoredImage;
pub use shirt::{Condition, Shirt, ShirtColor, ShirtSize, ShirtType};
pub use user::{AuthProvider, PublicUser, User};
pub use wishlist::{Priority, WishlistItem, WishlistType};
