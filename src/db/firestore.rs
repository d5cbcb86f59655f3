// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend.
//!
//! Documents are stored as serde objects keyed by their `_id`. The typed
//! per-collection operations live on [`crate::db::Database`]; this module
//! only provides the generic document primitives.

use crate::error::AppError;
use firestore::errors::FirestoreError;
use firestore::FirestoreDb;
use serde::{Deserialize, Serialize};

/// Deletes per transaction; Firestore caps a commit at 500 writes.
const DELETE_CHUNK: usize = 400;

/// Emulators accept any bearer token; this one is an unsigned JWT.
const EMULATOR_TOKEN: &str = "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJzaGlydC1jb2xsZWN0b3IifQ.";

fn store_error(context: &'static str) -> impl Fn(FirestoreError) -> AppError {
    move |e| AppError::Database(format!("{}: {}", context, e))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreDb,
}

impl FirestoreStore {
    /// Connect to Firestore, or to the emulator named by
    /// `FIRESTORE_EMULATOR_HOST` without any credentials.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        let emulator = std::env::var("FIRESTORE_EMULATOR_HOST").ok();

        let client = match &emulator {
            None => FirestoreDb::new(project_id)
                .await
                .map_err(store_error("Failed to connect to Firestore"))?,
            Some(_) => {
                let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
                    Ok(gcloud_sdk::Token {
                        token_type: "Bearer".to_string(),
                        token: gcloud_sdk::SecretValue::new(EMULATOR_TOKEN.to_string().into()),
                        expiry: chrono::Utc::now() + chrono::Duration::hours(1),
                    })
                });

                FirestoreDb::with_options_token_source(
                    firestore::FirestoreDbOptions::new(project_id.to_string()),
                    gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
                    gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
                )
                .await
                .map_err(store_error("Failed to connect to Firestore emulator"))?
            }
        };

        tracing::info!(
            project = project_id,
            emulator = emulator.as_deref().unwrap_or("none"),
            "Connected to Firestore"
        );

        Ok(Self { client })
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(store_error("Document read failed"))
    }

    /// Create or replace a document.
    pub async fn put<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(store_error("Document write failed"))?;
        Ok(())
    }

    /// Create a document only if `id` is unused. Returns false when it
    /// already exists.
    pub async fn create<T>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let created: Result<T, _> = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await;

        match created {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(store_error("Document create failed")(e)),
        }
    }

    /// All documents whose string `field` equals `value`.
    pub async fn find_by<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .obj()
            .query()
            .await
            .map_err(store_error("Query failed"))
    }

    /// Delete one document; deleting a missing document is not an error.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(store_error("Document delete failed"))
    }

    /// Delete many documents, one transaction per chunk.
    pub async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        for chunk in ids.chunks(DELETE_CHUNK) {
            self.delete_chunk(collection, chunk).await?;
            tracing::debug!(collection, count = chunk.len(), "Deleted document chunk");
        }
        Ok(())
    }

    async fn delete_chunk(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(store_error("Failed to begin transaction"))?;

        for id in ids {
            self.client
                .fluent()
                .delete()
                .from(collection)
                .document_id(id)
                .add_to_transaction(&mut transaction)
                .map_err(store_error("Failed to queue delete"))?;
        }

        transaction
            .commit()
            .await
            .map_err(store_error("Failed to commit deletes"))?;
        Ok(())
    }
}
