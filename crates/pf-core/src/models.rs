//! # Domain Models
//!
//! These structs represent the content entities of the portfolio: Projects,
//! Writings and build-in-public Tracks. Every kind embeds a [`ContentMeta`]
//! carrying identity and lifecycle fields, flattened into the same JSON
//! document. We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slug::generate_slug;

/// Category assigned when the author leaves it blank.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// The three top-level content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Writing,
    Track,
}

impl EntityKind {
    /// Name of the collection (table) holding this kind's documents.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Project => "projects",
            EntityKind::Writing => "writings",
            EntityKind::Track => "tracks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Project => "Project",
            EntityKind::Writing => "Writing",
            EntityKind::Track => "Track",
        };
        f.write_str(label)
    }
}

/// Visibility state of an entity. Only `Published` entities are public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn is_public(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

/// Identity and lifecycle fields shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMeta {
    pub id: Uuid,
    pub title: String,
    /// URL-safe identifier, unique within the kind's collection
    pub slug: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ContentStatus,
    /// Set the first time the entity becomes `Published`, never cleared afterwards
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every write
    #[serde(default)]
    pub version: i64,
}

impl ContentMeta {
    /// Builds the metadata of a brand new entity from the author's input.
    pub fn new(draft: ContentDraft, now: DateTime<Utc>) -> Self {
        let title = draft.title.trim().to_string();
        Self {
            id: Uuid::now_v7(),
            slug: generate_slug(&title),
            title,
            category: normalize_category(draft.category),
            tags: normalize_tags(draft.tags),
            status: draft.status.unwrap_or_default(),
            published_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Applies the shared part of a patch. Slug and timestamps are handled
    /// by the service, which knows the previous state.
    pub fn apply(&mut self, patch: ContentPatch) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(category) = patch.category {
            self.category = normalize_category(Some(category));
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// Records the first publication. Re-publishing keeps the original date.
    pub fn stamp_publication(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == ContentStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
            return true;
        }
        false
    }

    /// Timestamp used by the newest/oldest orderings.
    pub fn sort_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

fn normalize_category(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Trims tags and drops blank and repeated ones, keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Author-supplied fields shared by every create request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentDraft {
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: Option<ContentStatus>,
}

/// Shared part of an update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
}

// ── Project ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomLink {
    pub title: String,
    pub url: String,
}

/// A showcased piece of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub description: String,
    /// Long-form body, may contain markup
    #[serde(default)]
    pub content: String,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub custom_links: Vec<CustomLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDraft {
    #[serde(flatten)]
    pub common: ContentDraft,
    pub description: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    pub is_featured: bool,
    pub custom_links: Vec<CustomLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
    #[serde(flatten)]
    pub common: ContentPatch,
    pub description: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    pub is_featured: Option<bool>,
    pub custom_links: Option<Vec<CustomLink>>,
}

// ── Writing ─────────────────────────────────────────────────────────────────

/// Search-engine metadata. Empty fields fall back to the writing's own data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seo {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Writing {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    /// Minutes, always derived from `content`
    #[serde(default)]
    pub reading_time: u32,
    #[serde(default)]
    pub seo: Seo,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WritingDraft {
    #[serde(flatten)]
    pub common: ContentDraft,
    pub content: String,
    pub excerpt: String,
    pub seo: Seo,
    pub cover_image: Option<String>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WritingPatch {
    #[serde(flatten)]
    pub common: ContentPatch,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub seo: Option<Seo>,
    pub cover_image: Option<String>,
    pub is_featured: Option<bool>,
}

// ── Track ───────────────────────────────────────────────────────────────────

/// One entry of a track's progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackUpdate {
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub achieved: bool,
    pub date: Option<DateTime<Utc>>,
}

/// Body of an append-update request; `date` defaults to now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTrackUpdate {
    pub title: String,
    pub content: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMilestone {
    pub title: String,
    pub achieved: bool,
    pub date: Option<DateTime<Utc>>,
}

/// A "build in public" progress tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(flatten)]
    pub meta: ContentMeta,
    pub description: String,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    #[serde(default)]
    pub updates: Vec<TrackUpdate>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Derived from `milestones` on every write
    #[serde(default)]
    pub progress: u8,
}

impl Track {
    /// Percentage of achieved milestones, 0 when there are none.
    pub fn compute_progress(&self) -> u8 {
        let total = self.milestones.len();
        if total == 0 {
            return 0;
        }
        let achieved = self.milestones.iter().filter(|m| m.achieved).count();
        ((achieved as f64 * 100.0) / total as f64).round() as u8
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackDraft {
    #[serde(flatten)]
    pub common: ContentDraft,
    pub description: String,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    pub updates: Vec<TrackUpdate>,
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackPatch {
    #[serde(flatten)]
    pub common: ContentPatch,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub link: Option<String>,
    pub github: Option<String>,
    pub milestones: Option<Vec<Milestone>>,
}

// ── Users ───────────────────────────────────────────────────────────────────

/// An admin account allowed to manage content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated admin session carried by the `auth_token` cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
