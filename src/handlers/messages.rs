use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::errors::Result;
use crate::models::message::{MessageDetail, MessageTables, ResolvedMessage};
use crate::services::message_constants;
use crate::state::AppState;

/// Database rows topped up with every constant the database lacks.
pub async fn merged_tables(State(state): State<AppState>) -> Json<MessageTables> {
    Json(state.messages.merged_tables().await)
}

pub async fn db_tables(State(state): State<AppState>) -> Result<Json<MessageTables>> {
    Ok(Json(state.messages.tables().await?))
}

pub async fn resolve(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<ResolvedMessage> {
    Json(state.messages.resolve(&code).await)
}

pub async fn message_detail(
    State(state): State<AppState>,
    Path((type_name, code)): Path<(String, String)>,
) -> Json<MessageDetail> {
    Json(state.messages.resolve_by_type(&type_name, &code).await)
}

pub async fn constants() -> Json<Value> {
    Json(message_constants::as_json())
}
