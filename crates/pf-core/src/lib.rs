//! portfolio/crates/pf-core/src/lib.rs
//!
//! The central content logic and interface definitions for the portfolio:
//! entity models, lifecycle rules, derived fields and the list pipeline.

pub mod derived;
pub mod entity;
pub mod error;
pub mod models;
pub mod query;
pub mod service;
pub mod slug;
pub mod traits;

// Re-exporting for easier access in other crates
pub use entity::Entity;
pub use error::*;
pub use models::*;
pub use query::{facets, query, Facets, ListQuery, Page, SortOrder, TagCount};
pub use service::{ContentService, Visibility};
pub use traits::*;

/// Lifetime of an admin session, in days.
pub const SESSION_TTL_DAYS: i64 = 7;
