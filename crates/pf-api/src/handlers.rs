//! # pf-api Handlers
//!
//! Content endpoints. One generic set of handlers serves every entity kind;
//! the route table instantiates them per kind.

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use pf_core::traits::{AuthProvider, DocumentStore, UserRepo};
use pf_core::{
    facets, query, ContentService, ContentStatus, Entity, Facets, ListQuery, NewMilestone,
    NewTrackUpdate, Page, SortOrder, Track, Visibility,
};
use pf_ui::SiteInfo;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{current_session, require_admin};
use crate::error::ApiResult;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub site: SiteInfo,
    /// Adds `Secure` to the session cookie
    pub cookie_secure: bool,
}

impl AppState {
    pub fn content<E: Entity>(&self) -> ContentService<E> {
        ContentService::new(self.store.clone())
    }

    /// Admins see everything (optionally narrowed to `status`); everyone
    /// else only sees published entities.
    fn visibility(&self, req: &HttpRequest, status: Option<ContentStatus>) -> Visibility {
        match current_session(req, self) {
            Some(_) => Visibility::Admin(status),
            None => Visibility::Public,
        }
    }
}

/// Query string of the list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    /// Comma-separated; an entity must carry all of them
    pub tags: Option<String>,
    pub sort: Option<SortOrder>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub featured: Option<bool>,
    /// Admin only, ignored for public readers
    pub status: Option<ContentStatus>,
}

impl ListParams {
    fn to_query<E: Entity>(&self) -> ListQuery {
        let defaults = ListQuery::for_kind::<E>();
        ListQuery {
            search: self.search.clone(),
            category: self.category.clone(),
            tags: self
                .tags
                .as_deref()
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            sort: self.sort.unwrap_or(defaults.sort),
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        }
    }
}

#[derive(Serialize)]
struct ListResponse<E: Serialize> {
    #[serde(flatten)]
    page: Page<E>,
    facets: Facets,
}

async fn visible_entities<E: Entity>(
    data: &AppState,
    req: &HttpRequest,
    params: &ListParams,
) -> ApiResult<Vec<E>> {
    let visibility = data.visibility(req, params.status);
    let mut entities = data.content::<E>().list(visibility).await?;
    if params.featured == Some(true) {
        entities.retain(|e| e.is_featured());
    }
    Ok(entities)
}

/// `GET /api/{kind}`: one page of the filtered, sorted collection.
pub async fn list<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ListParams>,
) -> ApiResult<HttpResponse> {
    let entities = visible_entities::<E>(&data, &req, &params).await?;
    let page = query(entities, &params.to_query::<E>());
    let facets = facets(&page.items);
    Ok(HttpResponse::Ok().json(ListResponse { page, facets }))
}

/// `GET /api/{kind}/facets`: categories and tag counts over every visible
/// entity, independent of paging.
pub async fn list_facets<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ListParams>,
) -> ApiResult<HttpResponse> {
    let entities = visible_entities::<E>(&data, &req, &params).await?;
    Ok(HttpResponse::Ok().json(facets(&entities)))
}

pub async fn get_one<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let visibility = data.visibility(&req, None);
    let entity: E = data.content::<E>().get_visible(&path, visibility).await?;
    Ok(HttpResponse::Ok().json(entity))
}

pub async fn create<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<E::Draft>,
) -> ApiResult<HttpResponse> {
    let session = require_admin(&req, &data)?;
    let entity: E = data.content::<E>().create(body.into_inner()).await?;
    log::info!("{} '{}' created by {}", E::KIND, entity.meta().slug, session.username);
    Ok(HttpResponse::Created().json(entity))
}

/// `PUT /api/{kind}/{slug}`: partial update. A changed title moves the
/// entity to a new slug; the response carries it.
pub async fn update<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<E::Patch>,
) -> ApiResult<HttpResponse> {
    let session = require_admin(&req, &data)?;
    let entity: E = data.content::<E>().update(&path, body.into_inner()).await?;
    log::info!("{} '{}' updated by {}", E::KIND, entity.meta().slug, session.username);
    Ok(HttpResponse::Ok().json(entity))
}

pub async fn delete<E: Entity>(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let session = require_admin(&req, &data)?;
    let entity: E = data.content::<E>().delete(&path).await?;
    log::info!("{} '{}' deleted by {}", E::KIND, entity.meta().slug, session.username);
    Ok(HttpResponse::Ok().json(json!({ "deleted": entity.meta().slug })))
}

pub async fn append_update(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<NewTrackUpdate>,
) -> ApiResult<HttpResponse> {
    require_admin(&req, &data)?;
    let track = data.content::<Track>().append_update(&path, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(track))
}

pub async fn append_milestone(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<NewMilestone>,
) -> ApiResult<HttpResponse> {
    require_admin(&req, &data)?;
    let track = data.content::<Track>().append_milestone(&path, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(track))
}

pub async fn health(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    data.store.ping().await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::Project;

    #[test]
    fn tags_are_split_and_trimmed() {
        let params = ListParams {
            tags: Some(" rust, wasm ,,".into()),
            ..Default::default()
        };
        let q = params.to_query::<Project>();
        assert_eq!(q.tags, vec!["rust".to_string(), "wasm".to_string()]);
    }

    #[test]
    fn defaults_come_from_the_kind() {
        let q = ListParams::default().to_query::<Project>();
        assert_eq!(q, ListQuery::for_kind::<Project>());
        assert_eq!(q.page_size, 3);
    }
}
