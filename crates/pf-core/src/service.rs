//! # Content lifecycle
//!
//! `ContentService<E>` is the write path and admin read path for one entity
//! kind. It owns every lifecycle rule: required fields, slug assignment and
//! regeneration on rename, first-publication stamping, derived fields and
//! version bumps. All of it runs before the single call into the
//! [`DocumentStore`], so the store only ever sees complete documents.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{AppError, Result};
use crate::models::{ContentStatus, Milestone, NewMilestone, NewTrackUpdate, Track, TrackUpdate};
use crate::slug::generate_slug;
use crate::traits::{Document, DocumentStore};

/// How many times an append re-reads the track after losing a race.
const APPEND_ATTEMPTS: usize = 3;

/// Who is reading. Public readers only ever see published entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Admins see every status, optionally narrowed to one.
    Admin(Option<ContentStatus>),
}

impl Visibility {
    pub fn allows(&self, status: ContentStatus) -> bool {
        match self {
            Visibility::Public => status.is_public(),
            Visibility::Admin(None) => true,
            Visibility::Admin(Some(wanted)) => *wanted == status,
        }
    }
}

pub struct ContentService<E: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for ContentService<E> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<E: Entity> ContentService<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Validates, assigns identity and derived fields, then persists once.
    pub async fn create(&self, draft: E::Draft) -> Result<E> {
        let now = Utc::now();
        let mut entity = E::from_draft(draft, now);
        entity.validate()?;
        entity.derive_fields();
        let meta = entity.meta_mut();
        meta.version = 1;
        if meta.stamp_publication(now) {
            log::info!("{} '{}' published on creation", E::KIND, meta.slug);
        }

        self.store.insert(E::KIND, to_document(&entity)?).await?;
        log::info!("{} '{}' created", E::KIND, entity.meta().slug);
        Ok(entity)
    }

    /// Fetches by slug regardless of status.
    pub async fn get_by_slug(&self, slug: &str) -> Result<E> {
        match self.store.find_by_slug(E::KIND, slug).await? {
            Some(doc) => from_document(doc),
            None => Err(AppError::not_found(E::KIND.to_string(), slug)),
        }
    }

    /// Fetches by slug, hiding entities the reader may not see behind a
    /// `NotFound` so drafts are indistinguishable from missing entities.
    pub async fn get_visible(&self, slug: &str, visibility: Visibility) -> Result<E> {
        let entity = self.get_by_slug(slug).await?;
        if !visibility.allows(entity.meta().status) {
            return Err(AppError::not_found(E::KIND.to_string(), slug));
        }
        Ok(entity)
    }

    /// Resolves a public slug first, then an internal id.
    pub async fn resolve(&self, id_or_slug: &str) -> Result<E> {
        if let Some(doc) = self.store.find_by_slug(E::KIND, id_or_slug).await? {
            return from_document(doc);
        }
        if let Ok(id) = Uuid::parse_str(id_or_slug) {
            if let Some(doc) = self.store.find_by_id(E::KIND, id).await? {
                return from_document(doc);
            }
        }
        Err(AppError::not_found(E::KIND.to_string(), id_or_slug))
    }

    /// Every entity of this kind the reader may see, in storage order.
    pub async fn list(&self, visibility: Visibility) -> Result<Vec<E>> {
        let docs = self.store.list(E::KIND).await?;
        let mut entities = Vec::with_capacity(docs.len());
        for doc in docs {
            let entity: E = from_document(doc)?;
            if visibility.allows(entity.meta().status) {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    /// Applies `patch`. A changed title regenerates the slug, so the old
    /// public URL stops resolving.
    pub async fn update(&self, id_or_slug: &str, patch: E::Patch) -> Result<E> {
        let current = self.resolve(id_or_slug).await?;
        let expected_version = current.meta().version;
        let previous_title = current.meta().title.clone();

        let mut entity = current;
        entity.apply_patch(patch);
        entity.validate()?;
        entity.derive_fields();

        let now = Utc::now();
        let meta = entity.meta_mut();
        if meta.title != previous_title {
            let slug = generate_slug(&meta.title);
            log::info!("{} renamed, slug '{}' -> '{}'", E::KIND, meta.slug, slug);
            meta.slug = slug;
        }
        if meta.stamp_publication(now) {
            log::info!("{} '{}' published", E::KIND, meta.slug);
        }
        meta.updated_at = now;
        meta.version = expected_version + 1;

        let id = meta.id;
        let written = self
            .store
            .replace(E::KIND, to_document(&entity)?, expected_version)
            .await?;
        if !written {
            return Err(self.lost_race(id).await);
        }
        log::info!("{} '{}' updated", E::KIND, entity.meta().slug);
        Ok(entity)
    }

    /// Removes the entity permanently and returns what was deleted.
    pub async fn delete(&self, id_or_slug: &str) -> Result<E> {
        let entity = self.resolve(id_or_slug).await?;
        if !self.store.delete(E::KIND, entity.meta().id).await? {
            return Err(AppError::not_found(E::KIND.to_string(), id_or_slug));
        }
        log::info!("{} '{}' deleted", E::KIND, entity.meta().slug);
        Ok(entity)
    }

    async fn lost_race(&self, id: Uuid) -> AppError {
        match self.store.find_by_id(E::KIND, id).await {
            Ok(Some(_)) => AppError::Conflict(format!("{} was modified concurrently", E::KIND)),
            Ok(None) => AppError::not_found(E::KIND.to_string(), id.to_string()),
            Err(err) => err,
        }
    }

    /// Read-modify-write that retries when another writer bumped the
    /// version in between. Only used for commutative edits.
    async fn modify_with_retry<F>(&self, id_or_slug: &str, mut edit: F) -> Result<E>
    where
        F: FnMut(&mut E) + Send,
    {
        for attempt in 1..=APPEND_ATTEMPTS {
            let mut entity = self.resolve(id_or_slug).await?;
            let expected_version = entity.meta().version;
            edit(&mut entity);
            entity.derive_fields();
            let meta = entity.meta_mut();
            meta.updated_at = Utc::now();
            meta.version = expected_version + 1;

            if self
                .store
                .replace(E::KIND, to_document(&entity)?, expected_version)
                .await?
            {
                return Ok(entity);
            }
            log::warn!(
                "{} '{}' changed during append (attempt {attempt}/{APPEND_ATTEMPTS})",
                E::KIND,
                id_or_slug
            );
        }
        Err(AppError::Conflict(format!(
            "{} '{}' kept changing, append abandoned",
            E::KIND,
            id_or_slug
        )))
    }
}

impl ContentService<Track> {
    /// Appends to the track's progress log without re-validating the rest.
    pub async fn append_update(&self, id_or_slug: &str, update: NewTrackUpdate) -> Result<Track> {
        if update.title.trim().is_empty() || update.content.trim().is_empty() {
            return Err(AppError::validation("track updates need a title and content"));
        }
        let entry = TrackUpdate {
            title: update.title.trim().to_string(),
            content: update.content,
            date: update.date.unwrap_or_else(Utc::now),
        };
        self.modify_with_retry(id_or_slug, |track| track.updates.push(entry.clone()))
            .await
    }

    pub async fn append_milestone(&self, id_or_slug: &str, milestone: NewMilestone) -> Result<Track> {
        if milestone.title.trim().is_empty() {
            return Err(AppError::validation("milestones need a title"));
        }
        let entry = Milestone {
            title: milestone.title.trim().to_string(),
            achieved: milestone.achieved,
            date: milestone.date,
        };
        self.modify_with_retry(id_or_slug, |track| track.milestones.push(entry.clone()))
            .await
    }
}

fn to_document<E: Entity>(entity: &E) -> Result<Document> {
    let meta = entity.meta();
    Ok(Document {
        id: meta.id,
        slug: meta.slug.clone(),
        version: meta.version,
        body: serde_json::to_value(entity)?,
    })
}

fn from_document<E: Entity>(doc: Document) -> Result<E> {
    Ok(serde_json::from_value(doc.body)?)
}
