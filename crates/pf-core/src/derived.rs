//! # Derived fields
//!
//! Pure functions computing excerpt, reading time and SEO defaults from a
//! writing's raw content. The service runs them before the single
//! persistence write, so a failure never leaves a half-written document.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Seo;

/// Maximum excerpt length in characters, ellipsis excluded.
pub const EXCERPT_LENGTH: usize = 150;
pub const WORDS_PER_MINUTE: usize = 200;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Removes markup tags, decodes entities and collapses whitespace.
///
/// Tags are replaced by a space so adjacent block elements
/// (`<p>a</p><p>b</p>`) do not glue their words together.
pub fn strip_markup(content: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(content, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps an author-supplied excerpt, otherwise derives one from the content.
pub fn compute_excerpt(content: &str, existing: &str) -> String {
    if !existing.trim().is_empty() {
        return existing.to_string();
    }

    let plain = strip_markup(content);
    if plain.chars().count() <= EXCERPT_LENGTH {
        return plain;
    }

    let truncated: String = plain.chars().take(EXCERPT_LENGTH).collect();
    format!("{}...", truncated.trim_end())
}

/// Whole minutes needed to read `content` at 200 words per minute.
pub fn compute_reading_time(content: &str) -> u32 {
    if content.trim().is_empty() {
        return 0;
    }
    let words = strip_markup(content).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Fills every empty SEO field from the writing's title, excerpt and tags.
pub fn compute_default_seo(title: &str, excerpt: &str, tags: &[String], existing: &Seo) -> Seo {
    Seo {
        title: if existing.title.trim().is_empty() {
            title.to_string()
        } else {
            existing.title.clone()
        },
        description: if existing.description.trim().is_empty() {
            excerpt.to_string()
        } else {
            existing.description.clone()
        },
        keywords: if existing.keywords.is_empty() {
            tags.to_vec()
        } else {
            existing.keywords.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn strip_markup_removes_tags_and_entities() {
        let html = "<p>Hello <strong>big</strong>&nbsp;world</p><p>again &amp; again</p>";
        assert_eq!(strip_markup(html), "Hello big world again & again");
    }

    #[test]
    fn excerpt_keeps_author_value() {
        assert_eq!(compute_excerpt("<p>body</p>", "Mine"), "Mine");
    }

    #[test]
    fn excerpt_short_content_is_not_truncated() {
        assert_eq!(compute_excerpt("<p>Short   post</p>", ""), "Short post");
        assert_eq!(compute_excerpt("<p>x</p>", "   "), "x");
    }

    #[test]
    fn excerpt_truncates_with_ellipsis() {
        let content = format!("<p>{}</p>", "a".repeat(400));
        let excerpt = compute_excerpt(&content, "");
        assert!(excerpt.ends_with("..."));
        assert_eq!(excerpt.chars().count(), EXCERPT_LENGTH + 3);
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let content = "é".repeat(200);
        let excerpt = compute_excerpt(&content, "");
        assert_eq!(excerpt.trim_end_matches("...").chars().count(), EXCERPT_LENGTH);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(compute_reading_time(&words(1)), 1);
        assert_eq!(compute_reading_time(&words(200)), 1);
        assert_eq!(compute_reading_time(&words(201)), 2);
        assert_eq!(compute_reading_time(&format!("<p>{}</p>", words(450))), 3);
    }

    #[test]
    fn reading_time_of_empty_content_is_zero() {
        assert_eq!(compute_reading_time(""), 0);
        assert_eq!(compute_reading_time("   \n "), 0);
    }

    #[test]
    fn reading_time_of_markup_only_content_is_at_least_one() {
        assert_eq!(compute_reading_time("<p></p>"), 1);
    }

    #[test]
    fn seo_existing_values_win() {
        let existing = Seo {
            title: "Custom".into(),
            description: String::new(),
            keywords: vec!["k".into()],
        };
        let seo = compute_default_seo("Title", "Excerpt", &["t".into()], &existing);
        assert_eq!(seo.title, "Custom");
        assert_eq!(seo.description, "Excerpt");
        assert_eq!(seo.keywords, vec!["k".to_string()]);
    }

    #[test]
    fn seo_falls_back_to_writing_fields() {
        let seo = compute_default_seo("Title", "Excerpt", &["a".into(), "b".into()], &Seo::default());
        assert_eq!(seo.title, "Title");
        assert_eq!(seo.description, "Excerpt");
        assert_eq!(seo.keywords, vec!["a".to_string(), "b".to_string()]);
    }
}
