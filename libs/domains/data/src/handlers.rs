//! HTTP handlers for data search

use crate::error::DataError;
use crate::models::{SearchQuery, document_to_json};
use crate::repository::DataRepository;
use crate::service::DataService;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use pagination::Paginated;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// Data router state
pub type DataState<R> = Arc<DataService<R>>;

/// `GET /data/search`
pub fn data_router<R: DataRepository + 'static>() -> Router<DataState<R>> {
    Router::new().route("/data/search", get(search::<R>))
}

#[instrument(skip(state))]
pub async fn search<R: DataRepository>(
    State(state): State<DataState<R>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Paginated<Value>>, DataError> {
    let page = state.search(&query.query, query.pagination()).await?;
    Ok(Json(page.map(document_to_json)))
}
