//! Favorite ("heart") route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use storefinder_core::StoreId;

use crate::db::stores::StoreRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::stores::StoresTemplate;
use crate::state::AppState;

/// Response to a heart toggle.
#[derive(Debug, Serialize)]
pub struct HeartResponse {
    /// Whether the store is hearted after the toggle.
    pub hearted: bool,
    /// The user's full heart set after the toggle.
    pub hearts: Vec<StoreId>,
}

/// Toggle a store in the current user's heart set.
///
/// The toggle is one conditional statement at the repository, so concurrent
/// requests by the same user cannot lose updates.
#[instrument(skip(state, auth))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(store_id): Path<i32>,
) -> Result<Json<HeartResponse>> {
    let store_id = StoreId::new(store_id);

    // 404 for hearts on stores that don't exist
    StoreRepository::new(state.pool())
        .find_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {store_id}")))?;

    let users = UserRepository::new(state.pool());
    let hearted = users.toggle_heart(auth.id, store_id).await?;
    let hearts = users.hearts(auth.id).await?;

    Ok(Json(HeartResponse { hearted, hearts }))
}

/// The current user's hearted stores.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<StoresTemplate> {
    let hearts = UserRepository::new(state.pool()).hearts(auth.id).await?;
    let stores = StoreRepository::new(state.pool()).by_ids(&hearts).await?;

    let count = i64::try_from(stores.len()).unwrap_or(i64::MAX);
    Ok(StoresTemplate {
        title: "Hearted Stores".to_owned(),
        stores,
        page: 1,
        pages: 1,
        count,
        paginated: false,
    })
}
