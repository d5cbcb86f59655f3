// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shirt model: one physical football jersey owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::StoredImage;

pub const MAX_SHIRT_IMAGES: usize = 5;

/// Declares a string-backed enum with its wire names, `FromStr` and an
/// `ALL` list used by the filter options endpoint.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum!(
    /// Kit type.
    ShirtType {
        Home => "home",
        Away => "away",
        Third => "third",
        Fourth => "fourth",
        Goalkeeper => "goalkeeper",
        Special => "special",
        Training => "training",
        PreMatch => "pre-match",
    }
);

wire_enum!(
    ShirtSize {
        XS => "XS",
        S => "S",
        M => "M",
        L => "L",
        XL => "XL",
        XXL => "XXL",
        XXXL => "XXXL",
    }
);

wire_enum!(
    /// Physical condition, best first.
    Condition {
        NewWithTags => "new-with-tags",
        New => "new",
        Excellent => "excellent",
        VeryGood => "very-good",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
);

wire_enum!(
    /// Dominant shirt colour.
    ShirtColor {
        Red => "red",
        Blue => "blue",
        White => "white",
        Black => "black",
        Green => "green",
        Yellow => "yellow",
        Orange => "orange",
        Purple => "purple",
        Pink => "pink",
        Grey => "grey",
        Navy => "navy",
        Multicolor => "multicolor",
    }
);

impl Default for ShirtType {
    fn default() -> Self {
        ShirtType::Home
    }
}

/// Shirt record stored in the `shirts` collection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Shirt {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owner user id (immutable)
    pub user: String,
    #[validate(length(min = 1, max = 100, message = "Team name is required (max 100 characters)"))]
    pub team_name: String,
    #[validate(custom(function = "validate_season"))]
    pub season: String,
    #[serde(rename = "type", default)]
    pub kind: ShirtType,
    #[serde(default)]
    #[validate(length(max = 50, message = "Brand cannot exceed 50 characters"))]
    pub brand: Option<String>,
    #[serde(default)]
    pub size: Option<ShirtSize>,
    pub condition: Condition,
    #[serde(default)]
    #[validate(length(max = 50, message = "Player name cannot exceed 50 characters"))]
    pub player_name: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 99, message = "Player number must be between 0 and 99"))]
    pub player_number: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Competition cannot exceed 100 characters"))]
    pub competition: Option<String>,
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub match_worn: bool,
    #[serde(default)]
    pub player_issue: bool,
    #[serde(default)]
    pub color: Option<ShirtColor>,
    #[serde(default)]
    #[validate(length(max = 5, message = "A shirt can have at most 5 images"))]
    pub images: Vec<StoredImage>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(
        custom(function = "validate_amount"),
        range(min = 0.0, message = "Purchase price cannot be negative")
    )]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    #[validate(
        custom(function = "validate_amount"),
        range(min = 0.0, message = "Current value cannot be negative")
    )]
    pub current_value: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Purchase location cannot exceed 100 characters"))]
    pub purchase_location: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Money amounts must be finite; range checks alone let `NaN` through.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("amount").with_message("Amount must be a valid number".into()))
    }
}

/// Seasons are written `YYYY/YY`, e.g. `2023/24`.
pub fn validate_season(season: &str) -> Result<(), ValidationError> {
    let bytes = season.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'/'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit);

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("season")
            .with_message("Season must be in the format YYYY/YY (e.g. 2023/24)".into()))
    }
}
