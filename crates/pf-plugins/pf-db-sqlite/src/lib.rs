//! # pf-db-sqlite Implementation
//!
//! SQLite-backed `DocumentStore` and `UserRepo`. Each entity kind gets its
//! own table holding the full JSON document next to the columns we index:
//! `id`, a unique `slug`, and the optimistic `version` counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pf_core::error::{AppError, Result};
use pf_core::models::{EntityKind, User};
use pf_core::traits::{Document, DocumentStore, UserRepo};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

const KINDS: [EntityKind; 3] = [EntityKind::Project, EntityKind::Writing, EntityKind::Track];

/// Owns the connection pool for the process lifetime. Built once at
/// startup and handed to the handlers; `close` is the shutdown hook.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Connects with a default pool size of 5.
    pub async fn new(url: &str) -> Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens the pool and creates missing tables. A failed attempt leaves
    /// nothing cached, so the caller can simply try again.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        // Every connection to `sqlite::memory:` is a separate database, so
        // in-memory stores must funnel through one long-lived connection.
        let in_memory = url.contains(":memory:");
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| AppError::Connection(format!("cannot open {url}: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;
        log::info!("SQLite document store ready at {url}");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for kind in KINDS {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id      TEXT PRIMARY KEY NOT NULL,
                    slug    TEXT NOT NULL UNIQUE,
                    version INTEGER NOT NULL,
                    body    TEXT NOT NULL
                )",
                kind.collection()
            );
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(db_error(kind.collection()))?;
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                username      TEXT PRIMARY KEY NOT NULL,
                password_hash TEXT NOT NULL,
                created_at    TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(db_error("users"))?;
        Ok(())
    }

    /// Graceful shutdown: waits for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        log::info!("SQLite document store closed");
    }
}

/// Maps driver failures onto the domain error kinds.
fn db_error(collection: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("a document with this slug already exists in {collection}"))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::Connection(err.to_string())
        }
        _ => {
            log::error!("{collection}: {err}");
            AppError::Internal(format!("{collection} query failed"))
        }
    }
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let id: String = row.try_get("id").map_err(db_error("documents"))?;
    let body: String = row.try_get("body").map_err(db_error("documents"))?;
    Ok(Document {
        id: Uuid::parse_str(&id).map_err(|e| AppError::Internal(format!("bad stored id '{id}': {e}")))?,
        slug: row.try_get("slug").map_err(db_error("documents"))?,
        version: row.try_get("version").map_err(db_error("documents"))?,
        body: serde_json::from_str(&body)?,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("ping"))?;
        Ok(())
    }

    async fn insert(&self, kind: EntityKind, doc: Document) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (id, slug, version, body) VALUES (?, ?, ?, ?)",
            kind.collection()
        );
        sqlx::query(&sql)
            .bind(doc.id.to_string())
            .bind(&doc.slug)
            .bind(doc.version)
            .bind(serde_json::to_string(&doc.body)?)
            .execute(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        Ok(())
    }

    /// Compare-and-swap on the version column in a single statement.
    async fn replace(&self, kind: EntityKind, doc: Document, expected_version: i64) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET slug = ?, version = ?, body = ? WHERE id = ? AND version = ?",
            kind.collection()
        );
        let result = sqlx::query(&sql)
            .bind(&doc.slug)
            .bind(doc.version)
            .bind(serde_json::to_string(&doc.body)?)
            .bind(doc.id.to_string())
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT id, slug, version, body FROM {} WHERE id = ?",
            kind.collection()
        );
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn find_by_slug(&self, kind: EntityKind, slug: &str) -> Result<Option<Document>> {
        let sql = format!(
            "SELECT id, slug, version, body FROM {} WHERE slug = ?",
            kind.collection()
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        row.as_ref().map(row_to_document).transpose()
    }

    /// UUID v7 ids sort by creation time, so this is insertion order.
    async fn list(&self, kind: EntityKind) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT id, slug, version, body FROM {} ORDER BY id ASC",
            kind.collection()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        rows.iter().map(row_to_document).collect()
    }

    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", kind.collection());
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_error(kind.collection()))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteDocumentStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT username, password_hash, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("users"))?;

        match row {
            Some(row) => Ok(Some(User {
                username: row.try_get("username").map_err(db_error("users"))?,
                password_hash: row.try_get("password_hash").map_err(db_error("users"))?,
                created_at: row
                    .try_get::<DateTime<Utc>, _>("created_at")
                    .map_err(db_error("users"))?,
            })),
            None => Ok(None),
        }
    }

    /// Inserts the account, or rotates the password hash of an existing one.
    async fn upsert_user(&self, user: User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)
             ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("users"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new("sqlite::memory:").await.unwrap()
    }

    fn doc(slug: &str, version: i64) -> Document {
        Document {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
            version,
            body: json!({ "title": slug, "version": version }),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = store().await;
        let d = doc("hello-world", 1);
        store.insert(EntityKind::Writing, d.clone()).await.unwrap();

        let by_slug = store.find_by_slug(EntityKind::Writing, "hello-world").await.unwrap();
        assert_eq!(by_slug, Some(d.clone()));
        let by_id = store.find_by_id(EntityKind::Writing, d.id).await.unwrap();
        assert_eq!(by_id, Some(d));
        assert!(store.find_by_slug(EntityKind::Project, "hello-world").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict_within_a_collection_only() {
        let store = store().await;
        store.insert(EntityKind::Project, doc("same", 1)).await.unwrap();

        let err = store.insert(EntityKind::Project, doc("same", 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store.insert(EntityKind::Track, doc("same", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_checks_version() {
        let store = store().await;
        let mut d = doc("post", 1);
        store.insert(EntityKind::Writing, d.clone()).await.unwrap();

        d.version = 2;
        d.body = json!({ "title": "edited" });
        assert!(store.replace(EntityKind::Writing, d.clone(), 1).await.unwrap());

        // A writer still holding version 1 loses.
        d.version = 2;
        assert!(!store.replace(EntityKind::Writing, d.clone(), 1).await.unwrap());

        let stored = store.find_by_id(EntityKind::Writing, d.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.body["title"], "edited");
    }

    #[tokio::test]
    async fn test_replace_into_taken_slug_is_conflict() {
        let store = store().await;
        store.insert(EntityKind::Writing, doc("taken", 1)).await.unwrap();
        let mut other = doc("free", 1);
        store.insert(EntityKind::Writing, other.clone()).await.unwrap();

        other.slug = "taken".into();
        other.version = 2;
        let err = store.replace(EntityKind::Writing, other, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_is_in_creation_order_and_delete_removes() {
        let store = store().await;
        let a = doc("a", 1);
        let b = doc("b", 1);
        store.insert(EntityKind::Track, a.clone()).await.unwrap();
        store.insert(EntityKind::Track, b.clone()).await.unwrap();

        let slugs: Vec<String> = store
            .list(EntityKind::Track)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.slug)
            .collect();
        assert_eq!(slugs, vec!["a", "b"]);

        assert!(store.delete(EntityKind::Track, a.id).await.unwrap());
        assert!(!store.delete(EntityKind::Track, a.id).await.unwrap());
        assert_eq!(store.list(EntityKind::Track).await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_user_upsert_rotates_hash() {
        let store = store().await;
        let user = User {
            username: "admin".into(),
            password_hash: "hash-1".into(),
            created_at: Utc::now(),
        };
        store.upsert_user(user.clone()).await.unwrap();
        store
            .upsert_user(User { password_hash: "hash-2".into(), ..user.clone() })
            .await
            .unwrap();

        let found = store.find_user("admin").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash-2");
        assert!(store.find_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_pool_reports_connection_error() {
        let store = store().await;
        store.close().await;
        let err = store.ping().await.unwrap_err();
        assert!(matches!(err, AppError::Connection(_)));
    }
}
