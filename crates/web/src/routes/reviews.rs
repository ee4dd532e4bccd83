//! Review route handlers.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use storefinder_core::{Rating, StoreId};

use crate::db::reviews::ReviewRepository;
use crate::db::stores::StoreRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    #[serde(default)]
    pub text: String,
}

/// Add a review to a store, then return to its page.
#[instrument(skip(state, auth, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(store_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let rating = Rating::new(form.rating).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let store_id = StoreId::new(store_id);
    let store = StoreRepository::new(state.pool())
        .find_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {store_id}")))?;

    ReviewRepository::new(state.pool())
        .create(store_id, auth.id, rating, form.text.trim())
        .await?;

    Ok(Redirect::to(&format!("/store/{}", store.slug)))
}
