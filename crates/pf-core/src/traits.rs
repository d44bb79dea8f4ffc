//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EntityKind, Session, User};

/// A persisted entity as the document store sees it: indexed identity
/// columns next to the full JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub slug: String,
    pub version: i64,
    pub body: serde_json::Value,
}

/// Document persistence contract, one collection per entity kind.
///
/// Implementations must enforce slug uniqueness per collection and report a
/// violation as `AppError::Conflict`; an unreachable backend is
/// `AppError::Connection`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Cheap round-trip used by the health endpoint.
    async fn ping(&self) -> Result<()>;

    async fn insert(&self, kind: EntityKind, doc: Document) -> Result<()>;

    /// Overwrites the document only if its stored version still equals
    /// `expected_version`. Returns `false` when nothing was written.
    async fn replace(&self, kind: EntityKind, doc: Document, expected_version: i64) -> Result<bool>;

    async fn find_by_id(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>>;
    async fn find_by_slug(&self, kind: EntityKind, slug: &str) -> Result<Option<Document>>;
    async fn list(&self, kind: EntityKind) -> Result<Vec<Document>>;

    /// Returns `false` when no document had this id.
    async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<bool>;
}

/// Admin account persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>>;
    async fn upsert_user(&self, user: User) -> Result<()>;
}

/// Credential and session contract.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies a password against a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Creates a session for `username` and returns it with its cookie token.
    fn issue_session(&self, username: &str) -> Result<(String, Session)>;

    /// Decodes a cookie token. Forged, malformed and expired tokens yield `None`.
    fn read_session(&self, token: &str) -> Option<Session>;
}
