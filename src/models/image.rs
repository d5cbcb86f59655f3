// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted image reference stored on shirts and avatars.

use serde::{Deserialize, Deserializer, Serialize};

/// An image hosted by the image store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Asset identifier returned by the image host at upload time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

impl StoredImage {
    /// The asset id to destroy, falling back to parsing it out of the URL
    /// for records written before public ids were stored.
    pub fn asset_id(&self) -> Option<String> {
        self.public_id
            .clone()
            .or_else(|| public_id_from_url(&self.url))
    }
}

/// Older records stored images as bare URL strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredImageRepr {
    Url(String),
    #[serde(rename_all = "camelCase")]
    Full {
        url: String,
        #[serde(default)]
        thumbnail: Option<String>,
        #[serde(default)]
        public_id: Option<String>,
    },
}

impl<'de> Deserialize<'de> for StoredImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredImageRepr::deserialize(deserializer)? {
            StoredImageRepr::Url(url) => StoredImage {
                url,
                thumbnail: None,
                public_id: None,
            },
            StoredImageRepr::Full {
                url,
                thumbnail,
                public_id,
            } => StoredImage {
                url,
                thumbnail,
                public_id,
            },
        })
    }
}

/// Recover a Cloudinary public id from a delivery URL.
///
/// `https://res.cloudinary.com/<cloud>/image/upload/[<transforms>/][v123/]<folder>/<name>.<ext>`
/// yields `<folder>/<name>`. Returns `None` when the URL does not have that shape.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/upload/")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);

    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    // Drop transformation and version segments in front of the asset path.
    while segments.len() > 1 && (is_version(segments[0]) || segments[0].contains(',')) {
        segments.remove(0);
    }
    if segments.is_empty() {
        return None;
    }

    let last = segments.pop()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => last,
    };
    segments.push(stem);

    let joined = segments.join("/");
    let decoded = urlencoding::decode(&joined).ok()?.into_owned();
    Some(decoded)
}

fn is_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}
