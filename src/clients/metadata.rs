//! SQLite-backed metadata index of uploaded objects.
//!
//! Optional collaborator: when `DB_URL` is unset the repository runs
//! object-store-only and this module is never constructed.

use crate::{errors::StoreResult, models::object::Object};
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use tracing::info;

const OBJECTS_SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Non-empty `;`-separated statements of a schema script.
fn schema_statements(script: &str) -> impl Iterator<Item = &str> {
    script.split(';').map(str::trim).filter(|stmt| !stmt.is_empty())
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create(&self, object: &Object) -> StoreResult<()>;

    async fn find_one(&self, object_key: &str) -> StoreResult<Option<Object>>;

    async fn delete(&self, object_key: &str) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct SqliteMetadataStore {
    pub db: Arc<SqlitePool>,
}

impl SqliteMetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Open a pool for `url` and make sure the schema exists.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let store = Self::new(Arc::new(pool));
        store.apply_schema().await?;
        Ok(store)
    }

    /// Single-connection in-memory database; every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(Arc::new(pool));
        store.apply_schema().await?;
        Ok(store)
    }

    /// Create the `objects` table and its index if they are missing.
    /// All statements run in one transaction.
    pub async fn apply_schema(&self) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;
        let mut applied = 0;
        for stmt in schema_statements(OBJECTS_SCHEMA) {
            sqlx::query(stmt).execute(&mut *tx).await?;
            applied += 1;
        }
        tx.commit().await?;

        info!(statements = applied, "metadata schema ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn create(&self, object: &Object) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO objects (id, image_url, object_key, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(object.id)
        .bind(&object.image_url)
        .bind(&object.object_key)
        .bind(object.created_at)
        .bind(object.updated_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }

    async fn find_one(&self, object_key: &str) -> StoreResult<Option<Object>> {
        let object = sqlx::query_as::<_, Object>(
            "SELECT id, image_url, object_key, created_at, updated_at \
             FROM objects WHERE object_key = ?",
        )
        .bind(object_key)
        .fetch_optional(&*self.db)
        .await?;
        Ok(object)
    }

    async fn delete(&self, object_key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM objects WHERE object_key = ?")
            .bind(object_key)
            .execute(&*self.db)
            .await?;
        Ok(())
    }
}
