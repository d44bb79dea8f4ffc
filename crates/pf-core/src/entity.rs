//! # Entity contract
//!
//! Glue between the three content kinds and the generic lifecycle engine in
//! [`crate::service`]. Each kind knows how to build itself from a draft,
//! apply a patch, validate its required fields and refresh derived fields.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::derived::{compute_default_seo, compute_excerpt, compute_reading_time};
use crate::error::{AppError, Result};
use crate::models::*;

pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Page size used by the list endpoints when the caller gives none.
    const PAGE_SIZE: usize;

    type Draft: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Default + Send + 'static;

    fn meta(&self) -> &ContentMeta;
    fn meta_mut(&mut self) -> &mut ContentMeta;

    /// Builds an unsaved entity. Validation happens afterwards.
    fn from_draft(draft: Self::Draft, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: Self::Patch);

    /// Required-field check, run on every create and update.
    fn validate(&self) -> Result<()>;

    /// Free-text fields searched in addition to the title and tags.
    fn search_fields(&self) -> Vec<&str>;

    /// Recomputes fields derived from the content. No-op for most kinds.
    fn derive_fields(&mut self) {}

    fn is_featured(&self) -> bool {
        false
    }
}

fn require(value: &str, kind: EntityKind, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{kind} {field} is required")));
    }
    Ok(())
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;
    const PAGE_SIZE: usize = 3;

    type Draft = ProjectDraft;
    type Patch = ProjectPatch;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn from_draft(draft: ProjectDraft, now: DateTime<Utc>) -> Self {
        Project {
            meta: ContentMeta::new(draft.common, now),
            description: draft.description,
            content: draft.content,
            cover_image: draft.cover_image,
            link: draft.link,
            github: draft.github,
            is_featured: draft.is_featured,
            custom_links: draft.custom_links,
        }
    }

    fn apply_patch(&mut self, patch: ProjectPatch) {
        self.meta.apply(patch.common);
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = Some(cover_image);
        }
        if let Some(link) = patch.link {
            self.link = Some(link);
        }
        if let Some(github) = patch.github {
            self.github = Some(github);
        }
        if let Some(is_featured) = patch.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(custom_links) = patch.custom_links {
            self.custom_links = custom_links;
        }
    }

    fn validate(&self) -> Result<()> {
        require(&self.meta.title, Self::KIND, "title")?;
        require(&self.description, Self::KIND, "description")?;
        for link in &self.custom_links {
            if link.title.trim().is_empty() || link.url.trim().is_empty() {
                return Err(AppError::validation("custom links need a title and a url"));
            }
        }
        Ok(())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.description.as_str(), self.content.as_str()]
    }

    fn is_featured(&self) -> bool {
        self.is_featured
    }
}

impl Entity for Writing {
    const KIND: EntityKind = EntityKind::Writing;
    const PAGE_SIZE: usize = 6;

    type Draft = WritingDraft;
    type Patch = WritingPatch;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn from_draft(draft: WritingDraft, now: DateTime<Utc>) -> Self {
        Writing {
            meta: ContentMeta::new(draft.common, now),
            content: draft.content,
            excerpt: draft.excerpt,
            reading_time: 0,
            seo: draft.seo,
            cover_image: draft.cover_image,
            is_featured: draft.is_featured,
        }
    }

    fn apply_patch(&mut self, patch: WritingPatch) {
        self.meta.apply(patch.common);
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(seo) = patch.seo {
            self.seo = seo;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = Some(cover_image);
        }
        if let Some(is_featured) = patch.is_featured {
            self.is_featured = is_featured;
        }
    }

    fn validate(&self) -> Result<()> {
        require(&self.meta.title, Self::KIND, "title")?;
        require(&self.content, Self::KIND, "content")
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.content.as_str(), self.excerpt.as_str()]
    }

    fn derive_fields(&mut self) {
        self.excerpt = compute_excerpt(&self.content, &self.excerpt);
        self.reading_time = compute_reading_time(&self.content);
        self.seo = compute_default_seo(&self.meta.title, &self.excerpt, &self.meta.tags, &self.seo);
    }

    fn is_featured(&self) -> bool {
        self.is_featured
    }
}

impl Entity for Track {
    const KIND: EntityKind = EntityKind::Track;
    const PAGE_SIZE: usize = 6;

    type Draft = TrackDraft;
    type Patch = TrackPatch;

    fn meta(&self) -> &ContentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ContentMeta {
        &mut self.meta
    }

    fn from_draft(draft: TrackDraft, now: DateTime<Utc>) -> Self {
        let mut track = Track {
            meta: ContentMeta::new(draft.common, now),
            description: draft.description,
            cover_image: draft.cover_image,
            link: draft.link,
            github: draft.github,
            updates: draft.updates,
            milestones: draft.milestones,
            progress: 0,
        };
        track.progress = track.compute_progress();
        track
    }

    fn apply_patch(&mut self, patch: TrackPatch) {
        self.meta.apply(patch.common);
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = Some(cover_image);
        }
        if let Some(link) = patch.link {
            self.link = Some(link);
        }
        if let Some(github) = patch.github {
            self.github = Some(github);
        }
        if let Some(milestones) = patch.milestones {
            self.milestones = milestones;
        }
    }

    fn validate(&self) -> Result<()> {
        require(&self.meta.title, Self::KIND, "title")?;
        require(&self.description, Self::KIND, "description")
    }

    fn derive_fields(&mut self) {
        self.progress = self.compute_progress();
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.description.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writing_draft(title: &str, content: &str) -> WritingDraft {
        WritingDraft {
            common: ContentDraft {
                title: title.into(),
                tags: vec!["rust".into()],
                ..Default::default()
            },
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn draft_defaults() {
        let w = Writing::from_draft(writing_draft("  Hello, World! ", "<p>hi</p>"), Utc::now());
        assert_eq!(w.meta.title, "Hello, World!");
        assert_eq!(w.meta.slug, "hello-world");
        assert_eq!(w.meta.category, DEFAULT_CATEGORY);
        assert_eq!(w.meta.status, ContentStatus::Draft);
        assert!(w.meta.published_at.is_none());
        assert_eq!(w.meta.created_at, w.meta.updated_at);
    }

    #[test]
    fn writing_requires_content() {
        let w = Writing::from_draft(writing_draft("Title", "  "), Utc::now());
        assert!(matches!(w.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn project_requires_description() {
        let p = Project::from_draft(
            ProjectDraft {
                common: ContentDraft { title: "P".into(), ..Default::default() },
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(p.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn writing_derives_fields() {
        let mut w = Writing::from_draft(writing_draft("Title", "<p>Some body text</p>"), Utc::now());
        w.derive_fields();
        assert_eq!(w.excerpt, "Some body text");
        assert_eq!(w.reading_time, 1);
        assert_eq!(w.seo.title, "Title");
        assert_eq!(w.seo.description, "Some body text");
        assert_eq!(w.seo.keywords, vec!["rust".to_string()]);
    }

    #[test]
    fn patch_leaves_absent_fields_alone() {
        let mut w = Writing::from_draft(writing_draft("Title", "body"), Utc::now());
        w.apply_patch(WritingPatch {
            common: ContentPatch { category: Some("Notes".into()), ..Default::default() },
            ..Default::default()
        });
        assert_eq!(w.meta.title, "Title");
        assert_eq!(w.content, "body");
        assert_eq!(w.meta.category, "Notes");
    }

    #[test]
    fn blank_category_patch_resets_to_default() {
        let mut t = Track::from_draft(
            TrackDraft {
                common: ContentDraft {
                    title: "T".into(),
                    category: Some("Tools".into()),
                    ..Default::default()
                },
                description: "d".into(),
                ..Default::default()
            },
            Utc::now(),
        );
        assert_eq!(t.meta.category, "Tools");
        t.apply_patch(TrackPatch {
            common: ContentPatch { category: Some(" ".into()), ..Default::default() },
            ..Default::default()
        });
        assert_eq!(t.meta.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn tags_are_trimmed_on_create_and_patch() {
        let mut draft = writing_draft("Title", "body");
        draft.common.tags = vec![" rust".into(), "".into(), "rust ".into(), "web".into()];
        let mut w = Writing::from_draft(draft, Utc::now());
        assert_eq!(w.meta.tags, vec!["rust".to_string(), "web".to_string()]);

        w.apply_patch(WritingPatch {
            common: ContentPatch { tags: Some(vec!["  wasm  ".into(), " ".into()]), ..Default::default() },
            ..Default::default()
        });
        assert_eq!(w.meta.tags, vec!["wasm".to_string()]);
    }
}
