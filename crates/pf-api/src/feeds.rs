//! Feed, sitemap and robots.txt, generated from published content.

use actix_web::{web, HttpResponse};
use pf_core::{AppError, Project, Track, Visibility, Writing};

use crate::error::ApiResult;
use crate::handlers::AppState;

fn render_failed(err: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("template rendering failed: {err}"))
}

pub async fn feed(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let writings = data.content::<Writing>().list(Visibility::Public).await?;
    let xml = pf_ui::render_feed(&data.site, &writings).map_err(render_failed)?;
    Ok(HttpResponse::Ok()
        .content_type("application/rss+xml; charset=utf-8")
        .body(xml))
}

pub async fn sitemap(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let projects = data.content::<Project>().list(Visibility::Public).await?;
    let writings = data.content::<Writing>().list(Visibility::Public).await?;
    let tracks = data.content::<Track>().list(Visibility::Public).await?;
    let xml = pf_ui::render_sitemap(&data.site, &projects, &writings, &tracks)
        .map_err(render_failed)?;
    Ok(HttpResponse::Ok()
        .content_type("application/xml; charset=utf-8")
        .body(xml))
}

pub async fn robots(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(pf_ui::robots_txt(&data.site))
}
