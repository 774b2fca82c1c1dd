use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::dtos::address_dtos::AddressPayload;
use crate::errors::{AppError, Result};
use crate::handlers::field_errors_reply;
use crate::middleware::auth::AuthUser;
use crate::models::address::Address;
use crate::services::address_service::validate_address;
use crate::state::AppState;

const ADDRESS_SAVED: &str = "IA001";
const ADDRESS_UPDATED: &str = "IA002";

pub async fn check_address(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<serde_json::Value>> {
    let has_address = state.addresses.first_for_user(current.id).await?.is_some();
    Ok(Json(json!({ "has_address": has_address })))
}

pub async fn my_address(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Response> {
    match state.addresses.first_for_user(current.id).await? {
        Some(address) => Ok(Json(address).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "No address found" })),
        )
            .into_response()),
    }
}

pub async fn list_addresses(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.addresses.list_for_user(current.id).await?))
}

pub async fn create_address(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<AddressPayload>,
) -> Result<Response> {
    let fields = match validate_address(&payload, None) {
        Ok(fields) => fields,
        Err(errors) => return Ok(field_errors_reply(&state.messages, &errors).await),
    };

    let address = state.addresses.create(current.id, fields).await?;
    tracing::info!("Address {} created for user {}", address.id, current.id);

    Ok(saved(&state, StatusCode::CREATED, ADDRESS_SAVED, address).await)
}

pub async fn get_address(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Address>> {
    state
        .addresses
        .get(id, current.id)
        .await?
        .map(Json)
        .ok_or(AppError::DocumentNotFound)
}

/// PUT and PATCH: absent fields keep their stored values.
pub async fn update_address(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddressPayload>,
) -> Result<Response> {
    let existing = state
        .addresses
        .get(id, current.id)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    let fields = match validate_address(&payload, Some(&existing)) {
        Ok(fields) => fields,
        Err(errors) => return Ok(field_errors_reply(&state.messages, &errors).await),
    };

    let address = state
        .addresses
        .update(id, current.id, fields)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(saved(&state, StatusCode::OK, ADDRESS_UPDATED, address).await)
}

async fn saved(state: &AppState, status: StatusCode, code: &str, address: Address) -> Response {
    let msg = state.messages.resolve(code).await;
    (
        status,
        Json(json!({
            "code": msg.code,
            "message": msg.message,
            "address": address,
        })),
    )
        .into_response()
}
