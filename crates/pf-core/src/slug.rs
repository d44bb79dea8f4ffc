//! Slug generation.
//!
//! Slugs are derived from titles and never suffixed: two entities of the
//! same kind with titles that normalize identically collide at the store's
//! unique index and the write fails with `AppError::Conflict`.

use ::slug::slugify;

/// Used when a title has no alphanumeric content at all (e.g. "!!!").
pub const EMPTY_SLUG_PLACEHOLDER: &str = "untitled";

/// Lowercases, transliterates diacritics, collapses every run of
/// non-alphanumerics into a single hyphen and trims hyphens at both ends.
pub fn generate_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        EMPTY_SLUG_PLACEHOLDER.to_string()
    } else {
        slug
    }
}
