//! Database layer (Firestore, or in-process memory for development/tests).

mod claims;
pub mod firestore;
pub mod memory;
mod shirts;
mod users;
mod wishlist;

pub use claims::UniqueKey;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use users::DeletedUserData;

use crate::config::{Config, DatabaseBackend};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SHIRTS: &str = "shirts";
    pub const WISHLIST: &str = "wishlist";
    pub const EMAILS: &str = "emails";
    pub const USERNAMES: &str = "usernames";
}

/// Document store handle shared by all handlers.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
}

impl Database {
    /// Connect to the backend selected in the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.database_backend {
            DatabaseBackend::Firestore => {
                let store = FirestoreStore::new(&config.gcp_project_id).await?;
                Ok(Self {
                    backend: Backend::Firestore(store),
                })
            }
            DatabaseBackend::Memory => {
                tracing::warn!("Using in-memory database; data is lost on restart");
                Ok(Self::new_memory())
            }
        }
    }

    /// Create an empty in-memory database.
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    // ─── Generic Document Operations ─────────────────────────────

    async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.get(collection, id).await,
            Backend::Memory(store) => store.get(collection, id),
        }
    }

    async fn put<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.put(collection, id, doc).await,
            Backend::Memory(store) => store.put(collection, id, doc),
        }
    }

    async fn create<T>(&self, collection: &str, id: &str, doc: &T) -> Result<bool, AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.create(collection, id, doc).await,
            Backend::Memory(store) => store.create(collection, id, doc),
        }
    }

    async fn find_by<T>(&self, collection: &str, field: &str, value: &str) -> Result<Vec<T>, AppError>
    where
        T: for<'de> Deserialize<'de> + Send,
    {
        match &self.backend {
            Backend::Firestore(store) => store.find_by(collection, field, value).await,
            Backend::Memory(store) => store.find_by(collection, field, value),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.delete(collection, id).await,
            Backend::Memory(store) => {
                store.delete(collection, id);
                Ok(())
            }
        }
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        match &self.backend {
            Backend::Firestore(store) => store.delete_many(collection, ids).await,
            Backend::Memory(store) => {
                store.delete_many(collection, ids);
                Ok(())
            }
        }
    }
}
