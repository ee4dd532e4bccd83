//! Search API route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::discovery::{SEARCH_LIMIT, SearchHit};
use crate::error::Result;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Relevance search over store names and descriptions.
///
/// Returns the top 5 matches as `{slug, name, score}`. An empty or
/// whitespace-only `q` is a validation error, never "all stores".
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let hits = state.discovery().search(&query.q, SEARCH_LIMIT)?;
    Ok(Json(hits))
}
