use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::error::RelayError;
use crate::logic::{parse_request, validate};
use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, RelayError> {
    let Json(body) = payload?;
    let item = validate(parse_request(body)?)?;

    tracing::info!(collection_id = %item.collection_id, "relaying create item");
    let created = state.cms.create_item(&item).await?;
    Ok(Json(created))
}
