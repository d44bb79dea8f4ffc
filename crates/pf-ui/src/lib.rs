//! # pf-ui
//!
//! Generated documents served next to the API: the RSS feed, the sitemap
//! and robots.txt. Inputs are expected to be published entities only.

use askama::Template;
use chrono::{DateTime, Utc};
use pf_core::query::{sort_entities, SortOrder};
use pf_core::{Entity, Project, Track, Writing};

/// Number of writings exposed in the feed.
pub const FEED_LIMIT: usize = 20;

/// Site-wide values the documents need.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    /// Absolute base URL without trailing slash
    pub url: String,
    pub title: String,
    pub description: String,
}

pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub categories: Vec<String>,
}

#[derive(Template)]
#[template(path = "feed.xml")]
pub struct FeedTemplate<'a> {
    pub site: &'a SiteInfo,
    pub items: Vec<FeedItem>,
    pub last_build_date: Option<String>,
}

pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub urls: Vec<SitemapUrl>,
}

/// Public pages that always exist.
const STATIC_PAGES: [(&str, &str); 5] = [
    ("/", "1.0"),
    ("/about", "0.8"),
    ("/projects", "0.9"),
    ("/writings", "0.9"),
    ("/build", "0.9"),
];

/// RSS 2.0 document of the newest writings.
pub fn render_feed(site: &SiteInfo, writings: &[Writing]) -> askama::Result<String> {
    let mut newest = writings.to_vec();
    sort_entities(&mut newest, SortOrder::Newest);
    newest.truncate(FEED_LIMIT);

    let items: Vec<FeedItem> = newest
        .iter()
        .map(|w| {
            let mut categories = vec![w.meta.category.clone()];
            categories.extend(w.meta.tags.iter().cloned());
            FeedItem {
                title: w.meta.title.clone(),
                link: format!("{}/writings/{}", site.url, w.meta.slug),
                description: w.excerpt.clone(),
                pub_date: w.meta.sort_date().to_rfc2822(),
                categories,
            }
        })
        .collect();

    FeedTemplate {
        site,
        last_build_date: newest.first().map(|w| w.meta.sort_date().to_rfc2822()),
        items,
    }
    .render()
}

fn entity_urls<E: Entity>(site: &SiteInfo, section: &str, entities: &[E]) -> Vec<SitemapUrl> {
    entities
        .iter()
        .map(|e| SitemapUrl {
            loc: format!("{}/{}/{}", site.url, section, e.meta().slug),
            lastmod: Some(day(e.meta().updated_at)),
            changefreq: "monthly",
            priority: "0.7",
        })
        .collect()
}

fn day(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub fn render_sitemap(
    site: &SiteInfo,
    projects: &[Project],
    writings: &[Writing],
    tracks: &[Track],
) -> askama::Result<String> {
    let mut urls: Vec<SitemapUrl> = STATIC_PAGES
        .iter()
        .map(|&(path, priority)| SitemapUrl {
            loc: format!("{}{}", site.url, path),
            lastmod: None,
            changefreq: "weekly",
            priority,
        })
        .collect();
    urls.extend(entity_urls(site, "projects", projects));
    urls.extend(entity_urls(site, "writings", writings));
    urls.extend(entity_urls(site, "build", tracks));

    SitemapTemplate { urls }.render()
}

pub fn robots_txt(site: &SiteInfo) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api\n\nSitemap: {}/sitemap.xml\n",
        site.url
    )
}
