// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store for local development and tests.
//!
//! Documents are kept as JSON values so they go through the same serde
//! round trip as Firestore documents.

use crate::error::AppError;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{btree_map::Entry, BTreeMap};

#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        let doc = docs.get(id).cloned();
        doc.map(decode).transpose()
    }

    pub fn put<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError> {
        let value = encode(doc)?;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    /// Insert only if `id` is free. The collection shard stays locked for
    /// the check and the insert.
    pub fn create<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError> {
        let value = encode(doc)?;
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.entry(id.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    pub fn find_by<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let matching: Vec<serde_json::Value> = docs
            .values()
            .filter(|doc| doc.get(field).and_then(|v| v.as_str()) == Some(value))
            .cloned()
            .collect();
        matching.into_iter().map(decode).collect()
    }

    pub fn delete(&self, collection: &str, id: &str) {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }
    }

    pub fn delete_many(&self, collection: &str, ids: &[String]) {
        if let Some(mut docs) = self.collections.get_mut(collection) {
            for id in ids {
                docs.remove(id);
            }
        }
    }
}

fn encode<T: Serialize>(doc: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(doc)
        .map_err(|e| AppError::Database(format!("Failed to encode document: {}", e)))
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Failed to decode document: {}", e)))
}
