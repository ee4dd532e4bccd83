//! Map page and proximity API route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::discovery::{NEAR_LIMIT, NEAR_MAX_DISTANCE_M, NearbyStore};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Map page template.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {}

/// Proximity query parameters.
///
/// Missing or non-numeric values are rejected by the extractor before the
/// handler runs.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Map page.
#[instrument]
pub async fn page() -> MapTemplate {
    MapTemplate {}
}

/// Stores within 10 km of the given point, nearest first, at most 10.
///
/// The point arrives as `lat`/`lng` query parameters but is handed to the
/// engine in (longitude, latitude) order - the stored order.
#[instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<NearbyStore>>> {
    let stores = state
        .discovery()
        .near(query.lng, query.lat, NEAR_MAX_DISTANCE_M, NEAR_LIMIT)?;
    Ok(Json(stores))
}
