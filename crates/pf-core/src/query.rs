//! # List / filter / sort pipeline
//!
//! Turns a loaded collection into a view-ready page:
//! search (OR over title, body fields and tags) → category → tags (AND) →
//! sort → paginate. Facets are computed separately over whatever slice the
//! caller hands in.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use deunicode::deunicode;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub sort: SortOrder,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl ListQuery {
    /// First page with the kind's default page size and no filters.
    pub fn for_kind<E: Entity>() -> Self {
        Self {
            search: None,
            category: None,
            tags: Vec::new(),
            sort: SortOrder::default(),
            page: 1,
            page_size: E::PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// True iff this page came back full. A corpus that ends exactly on a
    /// page boundary therefore costs the client one extra, empty request.
    pub has_more: bool,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub tags: Vec<TagCount>,
}

/// Runs the whole pipeline over `entities`.
pub fn query<E: Entity>(entities: Vec<E>, params: &ListQuery) -> Page<E> {
    let needle = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES));

    let mut matched: Vec<E> = entities
        .into_iter()
        .filter(|e| needle.as_deref().map_or(true, |n| matches_search(e, n)))
        .filter(|e| category.map_or(true, |c| e.meta().category == c))
        .filter(|e| has_all_tags(e, &params.tags))
        .collect();

    sort_entities(&mut matched, params.sort);

    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, MAX_PAGE_SIZE);
    let items: Vec<E> = matched
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();

    Page {
        has_more: items.len() == page_size,
        items,
        page,
        page_size,
    }
}

/// Case-insensitive substring match; any single field matching is enough.
pub fn matches_search<E: Entity>(entity: &E, needle: &str) -> bool {
    let meta = entity.meta();
    meta.title.to_lowercase().contains(needle)
        || entity
            .search_fields()
            .iter()
            .any(|f| f.to_lowercase().contains(needle))
        || meta.tags.iter().any(|t| t.to_lowercase().contains(needle))
}

/// Every requested tag must be present on the entity. Both sides are
/// trimmed, matching how `facets` reports tags.
pub fn has_all_tags<E: Entity>(entity: &E, wanted: &[String]) -> bool {
    let tags = &entity.meta().tags;
    wanted
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .all(|w| tags.iter().any(|t| t.trim() == w))
}

pub fn sort_entities<E: Entity>(entities: &mut [E], order: SortOrder) {
    match order {
        SortOrder::Newest => entities.sort_by(|a, b| b.meta().sort_date().cmp(&a.meta().sort_date())),
        SortOrder::Oldest => entities.sort_by(|a, b| a.meta().sort_date().cmp(&b.meta().sort_date())),
        SortOrder::Title => entities.sort_by(|a, b| compare_titles(&a.meta().title, &b.meta().title)),
    }
}

/// Transliterated, case-folded key: "Élan" sorts between "apple" and "Zebra".
fn title_key(title: &str) -> String {
    deunicode(title).to_lowercase()
}

/// Compares folded keys, then the raw strings to keep the order total.
fn compare_titles(a: &str, b: &str) -> Ordering {
    title_key(a)
        .cmp(&title_key(b))
        .then_with(|| a.cmp(b))
}

/// Distinct categories and tag frequencies over `entities`. A tag repeated
/// on one entity counts once.
pub fn facets<E: Entity>(entities: &[E]) -> Facets {
    let categories: BTreeSet<String> = entities.iter().map(|e| e.meta().category.clone()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entity in entities {
        let distinct: BTreeSet<&str> = entity
            .meta()
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        for tag in distinct {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag: tag.to_string(), count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

    Facets {
        categories: categories.into_iter().collect(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentDraft, Project, ProjectDraft};
    use chrono::{Duration, TimeZone, Utc};

    fn project(title: &str, category: &str, tags: &[&str], day: u32) -> Project {
        let mut p = Project::from_draft(
            ProjectDraft {
                common: ContentDraft {
                    title: title.into(),
                    category: Some(category.into()),
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    status: None,
                },
                description: format!("About {title}"),
                ..Default::default()
            },
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        );
        p.meta.version = 1;
        p
    }

    fn titles(page: &Page<Project>) -> Vec<&str> {
        page.items.iter().map(|p| p.meta.title.as_str()).collect()
    }

    fn all(params: impl FnOnce(&mut ListQuery)) -> ListQuery {
        let mut q = ListQuery::for_kind::<Project>();
        q.page_size = MAX_PAGE_SIZE;
        params(&mut q);
        q
    }

    #[test]
    fn tag_filter_is_and_search_is_or() {
        let corpus = vec![project("First", "Web", &["a", "b"], 1), project("Second", "Web", &["a"], 2)];

        let by_tags = query(corpus.clone(), &all(|q| q.tags = vec!["a".into(), "b".into()]));
        assert_eq!(titles(&by_tags), vec!["First"]);

        let by_search = query(corpus, &all(|q| q.search = Some("a".into())));
        assert_eq!(by_search.items.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive_over_title_body_and_tags() {
        let corpus = vec![
            project("Compiler", "Tools", &[], 1),
            project("Blog", "Web", &["Rust"], 2),
            project("Game", "Fun", &[], 3),
        ];
        let page = query(corpus.clone(), &all(|q| q.search = Some("RUST".into())));
        assert_eq!(titles(&page), vec!["Blog"]);

        let page = query(corpus, &all(|q| q.search = Some("about comp".into())));
        assert_eq!(titles(&page), vec!["Compiler"]);
    }

    #[test]
    fn category_all_is_no_filter() {
        let corpus = vec![project("A", "Web", &[], 1), project("B", "Tools", &[], 2)];
        assert_eq!(query(corpus.clone(), &all(|q| q.category = Some("all".into()))).items.len(), 2);
        assert_eq!(
            titles(&query(corpus, &all(|q| q.category = Some("Tools".into())))),
            vec!["B"]
        );
    }

    #[test]
    fn newest_prefers_published_at_over_created_at() {
        let mut old = project("Old", "Web", &[], 1);
        old.meta.published_at = Some(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap());
        let corpus = vec![old, project("Mid", "Web", &[], 10), project("New", "Web", &[], 15)];

        let newest = query(corpus.clone(), &all(|_| {}));
        assert_eq!(titles(&newest), vec!["Old", "New", "Mid"]);

        let oldest = query(corpus, &all(|q| q.sort = SortOrder::Oldest));
        assert_eq!(titles(&oldest), vec!["Mid", "New", "Old"]);
    }

    #[test]
    fn title_sort_is_case_insensitive() {
        let corpus = vec![
            project("banana", "x", &[], 1),
            project("Apple", "x", &[], 2),
            project("cherry", "x", &[], 3),
        ];
        let page = query(corpus, &all(|q| q.sort = SortOrder::Title));
        assert_eq!(titles(&page), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn full_last_page_reports_has_more_then_empty_page_does_not() {
        let corpus: Vec<Project> = (1..=3).map(|d| project(&format!("P{d}"), "x", &[], d)).collect();
        let mut q = ListQuery::for_kind::<Project>();
        assert_eq!(q.page_size, 3);

        let first = query(corpus.clone(), &q);
        assert_eq!(first.items.len(), 3);
        assert!(first.has_more);

        q.page = 2;
        let second = query(corpus, &q);
        assert!(second.items.is_empty());
        assert!(!second.has_more);
    }

    #[test]
    fn partial_page_has_no_more() {
        let corpus: Vec<Project> = (1..=4).map(|d| project(&format!("P{d}"), "x", &[], d)).collect();
        let mut q = ListQuery::for_kind::<Project>();
        q.page = 2;
        let page = query(corpus, &q);
        assert_eq!(titles(&page), vec!["P1"]);
        assert!(!page.has_more);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let corpus = vec![project("Only", "x", &[], 1)];
        let mut q = ListQuery::for_kind::<Project>();
        q.page = 0;
        let page = query(corpus, &q);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn facets_dedupe_tags_per_entity() {
        let corpus = vec![
            project("A", "Web", &["rust", "rust", "wasm"], 1),
            project("B", "Tools", &["rust"], 2),
            project("C", "Web", &[], 3),
        ];
        let f = facets(&corpus);
        assert_eq!(f.categories, vec!["Tools".to_string(), "Web".to_string()]);
        assert_eq!(
            f.tags,
            vec![
                TagCount { tag: "rust".into(), count: 2 },
                TagCount { tag: "wasm".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn title_sort_folds_accents() {
        let corpus = vec![
            project("Zebra", "x", &[], 1),
            project("Élan", "x", &[], 2),
            project("apple", "x", &[], 3),
        ];
        let page = query(corpus, &all(|q| q.sort = SortOrder::Title));
        assert_eq!(titles(&page), vec!["apple", "Élan", "Zebra"]);
    }

    #[test]
    fn huge_page_number_is_empty_not_a_panic() {
        let corpus = vec![project("Only", "x", &[], 1)];
        let mut q = ListQuery::for_kind::<Project>();
        q.page = usize::MAX;
        let page = query(corpus, &q);
        assert_eq!(page.page, usize::MAX);
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn stored_padded_tag_matches_its_facet() {
        let mut padded = project("Padded", "x", &[], 1);
        padded.meta.tags = vec![" rust".into()];
        let corpus = vec![padded];

        let f = facets(&corpus);
        assert_eq!(f.tags, vec![TagCount { tag: "rust".into(), count: 1 }]);

        let page = query(corpus, &all(|q| q.tags = vec!["rust".into()]));
        assert_eq!(titles(&page), vec!["Padded"]);
    }

    #[test]
    fn sort_date_falls_back_to_created_at() {
        let p = project("A", "x", &[], 5);
        assert_eq!(p.meta.sort_date(), p.meta.created_at);
        let later = p.meta.created_at + Duration::days(1);
        let mut q = p.clone();
        q.meta.published_at = Some(later);
        assert_eq!(q.meta.sort_date(), later);
    }
}
