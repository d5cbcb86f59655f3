// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image hosting (Cloudinary signed upload API, or an in-memory mock).

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use crate::models::StoredImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use dashmap::DashSet;
use futures_util::future::join_all;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const THUMBNAIL_TRANSFORM: &str = "c_fill,w_400,h_400";

pub const SHIRT_FOLDER: &str = "shirt-collector/shirts";
pub const AVATAR_FOLDER: &str = "shirt-collector/avatars";

/// Largest accepted upload, per file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A file received from a multipart form, buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Reject non-image and oversized files before they reach the host.
    pub fn check(&self) -> Result<(), AppError> {
        if !self.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only image files are allowed".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest(
                "Image exceeds the 5MB size limit".to_string(),
            ));
        }
        Ok(())
    }

    fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

#[derive(Clone)]
enum Backend {
    Cloudinary {
        http: reqwest::Client,
        config: CloudinaryConfig,
    },
    Mock {
        assets: Arc<DashSet<String>>,
    },
}

/// Image store client shared by handlers.
#[derive(Clone)]
pub struct ImageStore {
    backend: Backend,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl ImageStore {
    /// Use Cloudinary when credentials are configured, otherwise the mock.
    pub fn from_config(config: Option<&CloudinaryConfig>) -> anyhow::Result<Self> {
        match config {
            Some(config) => Self::cloudinary(config.clone()),
            None => {
                tracing::warn!("Cloudinary not configured; using mock image store");
                Ok(Self::mock())
            }
        }
    }

    pub fn cloudinary(config: CloudinaryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            backend: Backend::Cloudinary { http, config },
        })
    }

    /// In-memory store producing deterministic-looking fake URLs.
    pub fn mock() -> Self {
        Self {
            backend: Backend::Mock {
                assets: Arc::new(DashSet::new()),
            },
        }
    }

    /// Number of live assets held by the mock store (0 for Cloudinary).
    pub fn mock_asset_count(&self) -> usize {
        match &self.backend {
            Backend::Mock { assets } => assets.len(),
            Backend::Cloudinary { .. } => 0,
        }
    }

    /// Upload one file into `folder`.
    pub async fn upload(&self, file: &UploadedFile, folder: &str) -> Result<StoredImage, AppError> {
        file.check()?;

        match &self.backend {
            Backend::Mock { assets } => {
                let public_id = format!("{}/{}", folder, uuid::Uuid::new_v4());
                let url = format!(
                    "https://res.cloudinary.com/mock/image/upload/v1/{}.jpg",
                    public_id
                );
                assets.insert(public_id.clone());
                Ok(StoredImage {
                    thumbnail: Some(thumbnail_url(&url)),
                    url,
                    public_id: Some(public_id),
                })
            }
            Backend::Cloudinary { http, config } => {
                let timestamp = unix_timestamp();
                let params = [("folder", folder.to_string()), ("timestamp", timestamp)];
                let signature = sign(&params, &config.api_secret);

                let form = [
                    ("file", file.data_uri()),
                    ("api_key", config.api_key.clone()),
                    ("folder", params[0].1.clone()),
                    ("timestamp", params[1].1.clone()),
                    ("signature", signature),
                    ("signature_algorithm", "sha256".to_string()),
                ];

                let url = format!("{}/{}/image/upload", CLOUDINARY_API_BASE, config.cloud_name);
                let response = http
                    .post(&url)
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| AppError::ExternalService(format!("Image upload failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalService(format!(
                        "Image upload returned {}: {}",
                        status, body
                    )));
                }

                let uploaded: UploadResponse = response.json().await.map_err(|e| {
                    AppError::ExternalService(format!("Invalid upload response: {}", e))
                })?;

                tracing::debug!(public_id = %uploaded.public_id, "Image uploaded");

                Ok(StoredImage {
                    thumbnail: Some(thumbnail_url(&uploaded.secure_url)),
                    url: uploaded.secure_url,
                    public_id: Some(uploaded.public_id),
                })
            }
        }
    }

    /// Upload several files concurrently. If any upload fails, the ones
    /// that succeeded are destroyed again before returning the error.
    pub async fn upload_all(
        &self,
        files: &[UploadedFile],
        folder: &str,
    ) -> Result<Vec<StoredImage>, AppError> {
        for file in files {
            file.check()?;
        }

        let results = join_all(files.iter().map(|f| self.upload(f, folder))).await;

        let mut uploaded = Vec::with_capacity(results.len());
        let mut first_err = None;
        for result in results {
            match result {
                Ok(image) => uploaded.push(image),
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            None => Ok(uploaded),
            Some(err) => {
                self.destroy_images(&uploaded).await;
                Err(err)
            }
        }
    }

    /// Delete one asset. "not found" counts as success.
    pub async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Mock { assets } => {
                assets.remove(public_id);
                Ok(())
            }
            Backend::Cloudinary { http, config } => {
                let timestamp = unix_timestamp();
                let params = [
                    ("public_id", public_id.to_string()),
                    ("timestamp", timestamp),
                ];
                let signature = sign(&params, &config.api_secret);

                let form = [
                    ("public_id", params[0].1.clone()),
                    ("timestamp", params[1].1.clone()),
                    ("api_key", config.api_key.clone()),
                    ("signature", signature),
                    ("signature_algorithm", "sha256".to_string()),
                ];

                let url = format!("{}/{}/image/destroy", CLOUDINARY_API_BASE, config.cloud_name);
                let response = http
                    .post(&url)
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| AppError::ExternalService(format!("Image delete failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(AppError::ExternalService(format!(
                        "Image delete returned {}",
                        response.status()
                    )));
                }

                let body: DestroyResponse = response.json().await.map_err(|e| {
                    AppError::ExternalService(format!("Invalid delete response: {}", e))
                })?;

                match body.result.as_str() {
                    "ok" | "not found" => Ok(()),
                    other => Err(AppError::ExternalService(format!(
                        "Image delete result: {}",
                        other
                    ))),
                }
            }
        }
    }

    /// Destroy a set of images concurrently. Failures are logged and
    /// otherwise ignored.
    pub async fn destroy_images(&self, images: &[StoredImage]) {
        let ids: Vec<String> = images.iter().filter_map(StoredImage::asset_id).collect();
        self.destroy_ids(&ids).await;
    }

    /// Destroy a set of assets by public id, logging failures.
    pub async fn destroy_ids(&self, public_ids: &[String]) {
        let results = join_all(public_ids.iter().map(|id| self.destroy(id))).await;

        for (public_id, result) in public_ids.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(public_id = %public_id, error = %e, "Failed to delete image");
            }
        }
    }
}

/// Cloudinary delivery URL with a square crop transformation inserted.
pub fn thumbnail_url(url: &str) -> String {
    match url.split_once("/upload/") {
        Some((head, tail)) => format!("{}/upload/{}/{}", head, THUMBNAIL_TRANSFORM, tail),
        None => url.to_string(),
    }
}

/// Cloudinary request signature: the parameters sorted by name and joined as
/// `k=v&k=v`, followed by the API secret, hashed with SHA-256.
fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn unix_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .to_string()
}
