use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use brassline_catalog::{
    resolve_line_item, CatalogError, Category, Configuration, Finish, ItemSelection,
    LineItemConfig, LineItemPrice, Material, PriceBreakdown, Product,
};
use brassline_core::{Document, DocumentRepository};
use brassline_offer::Offer;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::AppError, middleware::require_admin, state::AppState};

/// A document type served by the generic CRUD handlers.
pub trait CatalogDocument: Document {
    fn repository(state: &AppState) -> Arc<dyn DocumentRepository<Self>>;

    /// Hook run before every create or update.
    fn before_write(&mut self) {}

    /// Carry server-owned fields over from the stored copy on update.
    fn before_update(&mut self, _existing: &Self) {}

    /// A key no two documents in the collection may share.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

macro_rules! catalog_document {
    ($ty:ty, $field:ident) => {
        impl CatalogDocument for $ty {
            fn repository(state: &AppState) -> Arc<dyn DocumentRepository<Self>> {
                state.repos.$field.clone()
            }
        }
    };
}

catalog_document!(Category, categories);
catalog_document!(Product, products);
catalog_document!(Material, materials);
catalog_document!(Finish, finishes);
catalog_document!(Configuration, configurations);

impl CatalogDocument for Offer {
    fn repository(state: &AppState) -> Arc<dyn DocumentRepository<Self>> {
        state.repos.offers.clone()
    }

    fn before_write(&mut self) {
        self.updated_at = Utc::now();
    }

    fn before_update(&mut self, existing: &Self) {
        self.times_used = existing.times_used;
        self.created_at = existing.created_at;
    }

    fn unique_key(&self) -> Option<String> {
        self.normalized_code()
    }
}

/// Public reads, admin writes.
pub fn collection_routes<T: CatalogDocument>(state: &AppState) -> Router<AppState> {
    let admin = middleware::from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .route(
            "/",
            get(list_documents::<T>).merge(post(create_document::<T>).route_layer(admin.clone())),
        )
        .route(
            "/{id}",
            get(get_document::<T>).merge(
                axum::routing::put(update_document::<T>)
                    .patch(update_document::<T>)
                    .delete(delete_document::<T>)
                    .route_layer(admin),
            ),
        )
}

/// Configurations also expose the price quote.
pub fn configuration_routes(state: &AppState) -> Router<AppState> {
    collection_routes::<Configuration>(state).route("/quote", post(quote))
}

pub async fn list_documents<T: CatalogDocument>(
    State(state): State<AppState>,
) -> Result<Json<Vec<T>>, AppError> {
    Ok(Json(T::repository(&state).list().await?))
}

pub async fn get_document<T: CatalogDocument>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<T>, AppError> {
    T::repository(&state)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::COLLECTION, id)))
}

pub async fn create_document<T: CatalogDocument>(
    State(state): State<AppState>,
    Json(mut doc): Json<T>,
) -> Result<(StatusCode, Json<T>), AppError> {
    doc.before_write();
    doc.validate().map_err(AppError::Validation)?;
    ensure_unique(&state, &doc).await?;
    T::repository(&state).insert(&doc).await?;

    tracing::info!("Created {} {}", T::COLLECTION, doc.id());
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn update_document<T: CatalogDocument>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut doc): Json<T>,
) -> Result<Json<T>, AppError> {
    let repo = T::repository(&state);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::COLLECTION, id)))?;

    doc.set_id(id);
    doc.before_update(&existing);
    doc.before_write();
    doc.validate().map_err(AppError::Validation)?;
    ensure_unique(&state, &doc).await?;
    repo.update(&doc).await?;

    Ok(Json(doc))
}

async fn ensure_unique<T: CatalogDocument>(state: &AppState, doc: &T) -> Result<(), AppError> {
    let Some(key) = doc.unique_key() else {
        return Ok(());
    };
    let taken = T::repository(state)
        .list()
        .await?
        .iter()
        .any(|other| other.id() != doc.id() && other.unique_key().as_deref() == Some(key.as_str()));
    if taken {
        return Err(AppError::Conflict(format!("{} key {} is already in use", T::COLLECTION, key)));
    }
    Ok(())
}

pub async fn delete_document<T: CatalogDocument>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    T::repository(&state).delete(id).await?;
    tracing::info!("Deleted {} {}", T::COLLECTION, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Look up every document a selection refers to and build its pricing input.
pub async fn resolve_selection(
    state: &AppState,
    selection: &ItemSelection,
) -> Result<(Product, LineItemConfig), AppError> {
    let product = state
        .repos
        .products
        .get(selection.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("products {} not found", selection.product_id)))?;

    let material = state
        .repos
        .materials
        .get(selection.material_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("materials {} not found", selection.material_id))
        })?;

    let configuration = state
        .repos
        .configurations
        .list()
        .await?
        .into_iter()
        .find(|c| c.product_id == product.id && c.material_id == material.id)
        .ok_or_else(|| CatalogError::MaterialNotOffered {
            product: product.name.clone(),
            material: material.name.clone(),
        })?;

    let finish = match selection.finish_id {
        Some(id) => state.repos.finishes.get(id).await?,
        None => None,
    };

    let config = resolve_line_item(&product, &configuration, &material, finish.as_ref(), selection)?;
    Ok((product, config))
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub unit_price_pence: i64,
    pub total_price_pence: i64,
    pub price: LineItemPrice,
    pub breakdown: PriceBreakdown,
}

/// POST /api/configurations/quote
pub async fn quote(
    State(state): State<AppState>,
    Json(selection): Json<ItemSelection>,
) -> Result<Json<QuoteResponse>, AppError> {
    let (_, config) = resolve_selection(&state, &selection).await?;
    let price = state.pricing.price(&config)?;

    Ok(Json(QuoteResponse {
        unit_price_pence: price.unit_price_pence,
        total_price_pence: price.total_price_pence,
        breakdown: state.rules.vat.breakdown(&price),
        price,
    }))
}
