// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unique emails and usernames.
//!
//! Each taken value has a marker document (`emails/{value}`,
//! `usernames/{value}`) naming its owner. Markers are only ever created
//! with create-if-absent, so two accounts cannot both hold one.

use super::{collections, Database};
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// A per-account value that no two users may share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Email,
    Username,
}

impl UniqueKey {
    fn collection(self) -> &'static str {
        match self {
            UniqueKey::Email => collections::EMAILS,
            UniqueKey::Username => collections::USERNAMES,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyClaim {
    user: String,
}

/// Document id for a value; emails may contain `/`.
fn claim_id(value: &str) -> String {
    urlencoding::encode(&value.to_lowercase()).into_owned()
}

impl Database {
    /// Claim `value` for `user_id`.
    ///
    /// Returns false when another user holds it. Claiming a value the user
    /// already holds succeeds.
    pub async fn claim_key(&self, key: UniqueKey, value: &str, user_id: &str) -> Result<bool, AppError> {
        let id = claim_id(value);
        let claim = KeyClaim {
            user: user_id.to_string(),
        };
        if self.create(key.collection(), &id, &claim).await? {
            return Ok(true);
        }

        let holder: Option<KeyClaim> = self.get(key.collection(), &id).await?;
        Ok(holder.is_some_and(|c| c.user == user_id))
    }

    /// Give up a claimed value. Releasing an unclaimed value is a no-op.
    pub async fn release_key(&self, key: UniqueKey, value: &str) -> Result<(), AppError> {
        self.delete(key.collection(), &claim_id(value)).await
    }
}
