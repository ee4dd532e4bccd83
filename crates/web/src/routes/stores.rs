//! Store route handlers: listing, detail, create/edit, top stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use storefinder_core::{Coordinates, Slug, StoreId};

use crate::db::reviews::ReviewRepository;
use crate::db::stores::{NewStore, StoreRepository, StoreUpdate};
use crate::db::users::UserRepository;
use crate::discovery::{self, ranking};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{Review, Store, store::TAG_CHOICES};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// Store listing template (also used for hearts and tag pages' store lists).
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub title: String,
    pub stores: Vec<Store>,
    pub page: i64,
    pub pages: i64,
    pub count: i64,
    pub paginated: bool,
}

/// Store detail template.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub store: Store,
    pub reviews: Vec<Review>,
    pub hearted: bool,
    pub logged_in: bool,
}

/// A tag checkbox in the add/edit form.
pub struct TagChoice {
    pub name: String,
    pub checked: bool,
}

/// Add/edit store form template.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub title: String,
    pub action: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub lng: String,
    pub lat: String,
    pub tag_choices: Vec<TagChoice>,
}

/// One row of the top-stores page.
pub struct TopStoreView {
    pub rank: usize,
    pub slug: String,
    pub name: String,
    pub photo: Option<String>,
    pub review_count: usize,
    pub average_display: String,
}

/// Top stores template.
#[derive(Template, WebTemplate)]
#[template(path = "top.html")]
pub struct TopStoresTemplate {
    pub stores: Vec<TopStoreView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Store listing, page 1.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Response> {
    listing_page(&state, 1).await
}

/// Store listing, explicit page. Pages past the end redirect to the last
/// valid page instead of rendering empty.
#[instrument(skip(state))]
pub async fn paged(State(state): State<AppState>, Path(page): Path<i64>) -> Result<Response> {
    if page < 1 {
        return Err(AppError::BadRequest("page must be at least 1".to_owned()));
    }
    listing_page(&state, page).await
}

async fn listing_page(state: &AppState, page: i64) -> Result<Response> {
    let stores = StoreRepository::new(state.pool());
    let page = stores.page(page).await?;

    if page.is_past_end() {
        let last = page.last_page();
        return Ok(Redirect::to(&format!("/stores/page/{last}")).into_response());
    }

    Ok(StoresTemplate {
        title: "Stores".to_owned(),
        stores: page.stores,
        page: page.page,
        pages: page.pages,
        count: page.count,
        paginated: true,
    }
    .into_response())
}

/// Store detail by slug, with its reviews joined on demand.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    let reviews = ReviewRepository::new(state.pool())
        .for_store(store.id)
        .await?;

    let hearted = match &auth {
        Some(user) => UserRepository::new(state.pool())
            .hearts(user.id)
            .await?
            .contains(&store.id),
        None => false,
    };

    Ok(StoreTemplate {
        store,
        reviews,
        hearted,
        logged_in: auth.is_some(),
    }
    .into_response())
}

/// Add-store form.
#[instrument(skip(_auth))]
pub async fn add_form(RequireAuth(_auth): RequireAuth) -> EditStoreTemplate {
    EditStoreTemplate {
        title: "Add Store".to_owned(),
        action: "/add".to_owned(),
        name: String::new(),
        description: String::new(),
        address: String::new(),
        lng: String::new(),
        lat: String::new(),
        tag_choices: tag_choices(&[]),
    }
}

/// Create a store. The slug is allocated from the name at the repository.
#[instrument(skip(state, auth, multipart))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    multipart: Multipart,
) -> Result<Response> {
    let form = parse_store_form(&state, multipart).await?;

    let new = NewStore {
        name: form.name,
        description: form.description,
        tags: form.tags,
        coordinates: form.coordinates,
        address: form.address,
        photo: form.photo,
        author_id: auth.id,
    };

    let store = StoreRepository::new(state.pool()).create(&new).await?;

    // The new store should be searchable right away
    state.start_discovery_indexing();

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Edit-store form; only the owning author may open it.
#[instrument(skip(state, auth))]
pub async fn edit_form(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let store = StoreRepository::new(state.pool())
        .find_by_id(StoreId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;

    if store.author_id != auth.id {
        return Err(AppError::Forbidden(
            "you must own a store to edit it".to_owned(),
        ));
    }

    Ok(EditStoreTemplate {
        title: format!("Edit {}", store.name),
        action: format!("/stores/{id}/edit"),
        name: store.name.clone(),
        description: store.description.clone(),
        address: store.location.address.clone(),
        lng: store.location.coordinates.longitude().to_string(),
        lat: store.location.coordinates.latitude().to_string(),
        tag_choices: tag_choices(&store.tags),
    }
    .into_response())
}

/// Update a store. The slug is recomputed only when the name changed.
#[instrument(skip(state, auth, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response> {
    let id = StoreId::new(id);
    let stores = StoreRepository::new(state.pool());

    let store = stores
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;
    if store.author_id != auth.id {
        return Err(AppError::Forbidden(
            "you must own a store to edit it".to_owned(),
        ));
    }

    let form = parse_store_form(&state, multipart).await?;
    let update = StoreUpdate {
        name: form.name,
        description: form.description,
        tags: form.tags,
        coordinates: form.coordinates,
        address: form.address,
        photo: form.photo,
    };

    let store = stores.update(id, auth.id, &update).await?;

    state.start_discovery_indexing();

    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Top stores: join reviews, keep stores with two or more, rank by average.
#[instrument(skip(state))]
pub async fn top(State(state): State<AppState>) -> Result<TopStoresTemplate> {
    let stores = StoreRepository::new(state.pool()).scan_all().await?;
    let reviews = ReviewRepository::new(state.pool()).scan_all().await?;

    let ranked = discovery::top_stores(&stores, &reviews, ranking::DEFAULT_LIMIT);

    let stores = ranked
        .into_iter()
        .enumerate()
        .map(|(i, top)| TopStoreView {
            rank: i + 1,
            slug: top.slug.into_inner(),
            name: top.name,
            photo: top.photo,
            review_count: top.reviews.len(),
            average_display: format!("{:.1}", top.average_rating),
        })
        .collect();

    Ok(TopStoresTemplate { stores })
}

// =============================================================================
// Form parsing
// =============================================================================

/// Validated fields from the multipart add/edit form.
struct StoreForm {
    name: String,
    description: String,
    address: String,
    coordinates: Coordinates,
    tags: Vec<String>,
    photo: Option<String>,
}

/// Parse and validate the multipart store form, storing the photo if one
/// was uploaded.
async fn parse_store_form(state: &AppState, mut multipart: Multipart) -> Result<StoreForm> {
    let mut name = String::new();
    let mut description = String::new();
    let mut address = String::new();
    let mut lng = String::new();
    let mut lat = String::new();
    let mut tags: Vec<String> = Vec::new();
    let mut photo: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form upload: {e}")))?
    {
        let field_name = field.name().map(ToOwned::to_owned);
        match field_name.as_deref() {
            Some("name") => name = read_text(field).await?,
            Some("description") => description = read_text(field).await?,
            Some("address") => address = read_text(field).await?,
            Some("lng") => lng = read_text(field).await?,
            Some("lat") => lat = read_text(field).await?,
            Some("tags") => tags.push(read_text(field).await?),
            Some("photo") => {
                let content_type = field.content_type().map(ToOwned::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid photo upload: {e}")))?;
                // An empty file input still submits a zero-length part
                if !bytes.is_empty() {
                    let content_type = content_type.ok_or_else(|| {
                        AppError::BadRequest("photo upload is missing a content type".to_owned())
                    })?;
                    photo = Some(state.photos().store_photo(&content_type, &bytes).await?);
                }
            }
            _ => {}
        }
    }

    let name = name.trim().to_owned();
    if name.is_empty() {
        return Err(AppError::BadRequest("Please enter a store name!".to_owned()));
    }
    // Reject names that cannot produce a URL before touching the database
    Slug::base(&name).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let address = address.trim().to_owned();
    if address.is_empty() {
        return Err(AppError::BadRequest("You must supply an address!".to_owned()));
    }

    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("longitude must be a number".to_owned()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("latitude must be a number".to_owned()))?;
    let coordinates =
        Coordinates::new(lng, lat).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let tags = tags
        .into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(StoreForm {
        name,
        description: description.trim().to_owned(),
        address,
        coordinates,
        tags,
        photo,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form field: {e}")))
}

/// Tag checkboxes with the store's current tags pre-checked.
fn tag_choices(selected: &[String]) -> Vec<TagChoice> {
    TAG_CHOICES
        .iter()
        .map(|&name| TagChoice {
            name: name.to_owned(),
            checked: selected.iter().any(|t| t == name),
        })
        .collect()
}
