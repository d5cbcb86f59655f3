// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in credential verification.
//!
//! The web client sends either a Google ID token (button / One Tap flow) or
//! an OAuth access token (popup flow). ID tokens are checked locally against
//! Google's signing keys; anything that does not verify as an ID token is
//! tried against the userinfo endpoint.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
/// Used when the key response carries no usable `max-age`
const KEY_SET_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity asserted by Google for a verified credential.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    /// Stable Google account subject
    pub google_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Why a credential was not accepted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GoogleAuthError {
    /// The credential is malformed, expired, or for another audience.
    #[error("invalid credential: {0}")]
    Invalid(String),
    /// Google could not be reached or answered unexpectedly.
    #[error("google unavailable: {0}")]
    Transient(String),
}

/// Claims shared by ID tokens and the userinfo response.
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleClaims {
    fn into_profile(self) -> Result<GoogleProfile, GoogleAuthError> {
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| GoogleAuthError::Invalid("no email in credential".to_string()))?;

        if self.email_verified == Some(false) {
            return Err(GoogleAuthError::Invalid("email not verified".to_string()));
        }

        Ok(GoogleProfile {
            google_id: self.sub,
            email,
            name: self.name.filter(|n| !n.trim().is_empty()),
            picture: self.picture,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
}

/// Signing keys fetched from Google, by key id.
struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

impl KeySet {
    fn get(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        if self.expires_at <= Instant::now() {
            return None;
        }
        self.keys.get(kid).cloned()
    }
}

enum KeySource {
    /// Google's published keys, cached for the advertised lifetime
    Remote {
        cached: RwLock<Option<KeySet>>,
        refreshing: Mutex<()>,
    },
    /// One fixed key; used by tests
    Static { kid: String, key: Arc<DecodingKey> },
}

/// Verifier for Google sign-in credentials.
pub struct GoogleAuthVerifier {
    http: reqwest::Client,
    /// Expected `aud` of ID tokens; without it only access tokens work
    client_id: Option<String>,
    /// `None` disables the access-token path
    userinfo_url: Option<&'static str>,
    keys: KeySource,
}

impl GoogleAuthVerifier {
    /// Verifier that checks ID tokens against Google's published keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if config.google_client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID not set; Google ID tokens will be rejected");
        }

        Ok(Self {
            http: http_client()?,
            client_id: config.google_client_id.clone(),
            userinfo_url: Some(USERINFO_URL),
            keys: KeySource::Remote {
                cached: RwLock::new(None),
                refreshing: Mutex::new(()),
            },
        })
    }

    /// Verifier trusting a single RSA key under `kid`, with no network
    /// access at all.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        anyhow::ensure!(!kid.trim().is_empty(), "static key id must not be empty");

        Ok(Self {
            http: http_client()?,
            client_id: config.google_client_id.clone(),
            userinfo_url: None,
            keys: KeySource::Static {
                kid,
                key: Arc::new(key),
            },
        })
    }

    /// Resolve a credential to a Google profile.
    pub async fn authenticate(&self, credential: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(GoogleAuthError::Invalid("empty credential".to_string()));
        }

        let id_token_err = match self.verify_id_token(credential).await {
            Ok(profile) => return Ok(profile),
            Err(e) => e,
        };
        tracing::debug!(error = %id_token_err, "Not a valid ID token, trying userinfo");

        match self.fetch_userinfo(credential).await {
            Ok(profile) => Ok(profile),
            // An outage while checking the ID token outranks a userinfo rejection
            Err(GoogleAuthError::Invalid(_)) if matches!(id_token_err, GoogleAuthError::Transient(_)) => {
                Err(id_token_err)
            }
            Err(e) => Err(e),
        }
    }

    /// Check signature, issuer, audience and expiry of an ID token.
    pub async fn verify_id_token(&self, token: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| GoogleAuthError::Invalid("no Google client ID configured".to_string()))?;

        let header = decode_header(token)
            .map_err(|e| GoogleAuthError::Invalid(format!("not a JWT: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(GoogleAuthError::Invalid(format!("unexpected alg {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| GoogleAuthError::Invalid("token has no kid".to_string()))?;

        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[client_id]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<GoogleClaims>(token, &key, &validation)
            .map_err(|e| GoogleAuthError::Invalid(e.to_string()))?
            .claims;

        tracing::debug!(subject = %claims.sub, "Google ID token verified");
        claims.into_profile()
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleProfile, GoogleAuthError> {
        let Some(url) = self.userinfo_url else {
            return Err(GoogleAuthError::Invalid("access tokens not accepted".to_string()));
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleAuthError::Transient(format!("userinfo request: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(GoogleAuthError::Invalid(format!("userinfo answered {status}")));
        }
        if !status.is_success() {
            return Err(GoogleAuthError::Transient(format!("userinfo answered {status}")));
        }

        response
            .json::<GoogleClaims>()
            .await
            .map_err(|e| GoogleAuthError::Transient(format!("userinfo body: {e}")))?
            .into_profile()
    }

    /// Find the key for `kid`, refetching Google's keys once if it is not
    /// cached (keys rotate).
    async fn signing_key(&self, kid: &str) -> Result<Arc<DecodingKey>, GoogleAuthError> {
        let (cached, refreshing) = match &self.keys {
            KeySource::Static { kid: known, key } if known == kid => return Ok(key.clone()),
            KeySource::Static { .. } => {
                return Err(GoogleAuthError::Invalid(format!("unknown kid {kid}")));
            }
            KeySource::Remote { cached, refreshing } => (cached, refreshing),
        };

        if let Some(key) = cached.read().await.as_ref().and_then(|set| set.get(kid)) {
            return Ok(key);
        }

        let _guard = refreshing.lock().await;
        // Another request may have refreshed while we waited
        if let Some(key) = cached.read().await.as_ref().and_then(|set| set.get(kid)) {
            return Ok(key);
        }

        let set = self.fetch_key_set().await?;
        let key = set.get(kid);
        *cached.write().await = Some(set);

        key.ok_or_else(|| GoogleAuthError::Invalid(format!("unknown kid {kid}")))
    }

    async fn fetch_key_set(&self) -> Result<KeySet, GoogleAuthError> {
        let response = self
            .http
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .map_err(|e| GoogleAuthError::Transient(format!("key fetch: {e}")))?;

        if !response.status().is_success() {
            return Err(GoogleAuthError::Transient(format!(
                "key fetch answered {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .map(Duration::from_secs)
            .unwrap_or(KEY_SET_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Transient(format!("key set body: {e}")))?;

        let keys: HashMap<String, Arc<DecodingKey>> = jwks
            .keys
            .into_iter()
            .filter(|jwk| jwk.kty == "RSA" && jwk.alg.as_deref().map_or(true, |a| a == "RS256"))
            .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => Some((jwk.kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(kid = %jwk.kid, error = %e, "Skipping unusable Google key");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            return Err(GoogleAuthError::Transient("no usable Google keys".to_string()));
        }

        tracing::debug!(keys = keys.len(), ttl_secs = ttl.as_secs(), "Fetched Google signing keys");

        Ok(KeySet {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("building Google HTTP client")
}

/// `max-age` from a Cache-Control header value.
fn max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")
            .and_then(|secs| secs.trim_matches('"').parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email: Option<&str>, verified: Option<bool>) -> GoogleClaims {
        GoogleClaims {
            sub: "sub-1".to_string(),
            email: email.map(str::to_string),
            email_verified: verified,
            name: Some(" ".to_string()),
            picture: None,
        }
    }

    #[test]
    fn test_max_age() {
        assert_eq!(max_age("public, max-age=19845, must-revalidate"), Some(19845));
        assert_eq!(max_age("max-age=\"120\""), Some(120));
        assert_eq!(max_age("no-store"), None);
        assert_eq!(max_age("max-age=soon"), None);
    }

    #[test]
    fn test_profile_needs_verified_email() {
        assert!(matches!(
            claims(None, Some(true)).into_profile(),
            Err(GoogleAuthError::Invalid(_))
        ));
        assert!(matches!(
            claims(Some("fan@example.com"), Some(false)).into_profile(),
            Err(GoogleAuthError::Invalid(_))
        ));
    }

    #[test]
    fn test_profile_normalizes_fields() {
        let profile = claims(Some(" Fan@Example.COM "), None).into_profile().unwrap();
        assert_eq!(profile.email, "fan@example.com");
        assert_eq!(profile.google_id, "sub-1");
        assert_eq!(profile.name, None);
    }

    #[tokio::test]
    async fn test_static_verifier_rejects_garbage_offline() {
        let config = Config::test_default();
        let verifier =
            GoogleAuthVerifier::new_with_static_key(&config, "kid-1", DecodingKey::from_secret(b"x"))
                .unwrap();

        let err = verifier.authenticate("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, GoogleAuthError::Invalid(_)));

        let err = verifier.authenticate("   ").await.unwrap_err();
        assert!(matches!(err, GoogleAuthError::Invalid(_)));
    }
}
