//! Tag browse route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::db::stores::StoreRepository;
use crate::discovery::{TagCount, tag_counts};
use crate::error::Result;
use crate::filters;
use crate::models::Store;
use crate::state::AppState;

/// Tag browse template: the facet list plus matching stores.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub title: String,
    pub active_tag: Option<String>,
    pub tags: Vec<TagCount>,
    pub stores: Vec<Store>,
}

/// Tag overview: every facet, plus all stores carrying at least one tag.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<TagsTemplate> {
    let repo = StoreRepository::new(state.pool());

    let all_stores = repo.scan_all().await?;
    let tags = tag_counts(&all_stores);
    let stores = repo.with_any_tag().await?;

    Ok(TagsTemplate {
        title: "Tags".to_owned(),
        active_tag: None,
        tags,
        stores,
    })
}

/// Stores carrying one specific tag, with the facet list alongside.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(tag): Path<String>) -> Result<TagsTemplate> {
    let repo = StoreRepository::new(state.pool());

    let all_stores = repo.scan_all().await?;
    let tags = tag_counts(&all_stores);
    let stores = repo.with_tag(&tag).await?;

    Ok(TagsTemplate {
        title: tag.clone(),
        active_tag: Some(tag),
        tags,
        stores,
    })
}
