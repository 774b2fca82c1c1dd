use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::dtos::admin_dtos::{AdminCreateUser, AdminUpdateUser, MessageText};
use crate::errors::{AppError, Result};
use crate::handlers::auth::registration_failed;
use crate::handlers::coded_reply;
use crate::handlers::profile::represent;
use crate::middleware::auth::AdminUser;
use crate::models::message::{MessageCategory, MessageRecord};
use crate::models::user::{normalize_email, Role, UserChanges, UserResponse, UserStats};
use crate::services::password::hash_password;
use crate::services::user_service::{Registration, RegistrationError};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "EP016";
const EMAIL_TAKEN: &str = "ES003";

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<UserResponse>>> {
    let users = state.users.list().await?;

    let mut out = Vec::with_capacity(users.len());
    for user in users {
        out.push(represent(&state, user).await?);
    }
    Ok(Json(out))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<AdminCreateUser>,
) -> Result<Response> {
    if !payload.has_required_fields() {
        return registration_failed(&state, RegistrationError::MissingFields).await;
    }
    if payload.validate().is_err() {
        return registration_failed(&state, RegistrationError::InvalidEmail).await;
    }
    let role = parse_role(payload.role.as_deref())?.unwrap_or(Role::User);

    let registration = Registration {
        username: payload.username.unwrap_or_default().trim().to_string(),
        email: normalize_email(&payload.email.unwrap_or_default()),
        phone: payload.phone.map(|phone| phone.trim().to_string()),
        password: payload.password.unwrap_or_default(),
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        role,
    };

    match state.users.register(registration, state.config.bcrypt_cost).await {
        Ok(user) => {
            tracing::info!("Admin {} <{}> created user {}", admin.username, admin.email, user.id);
            let body = represent(&state, user).await?;
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
        Err(err) => registration_failed(&state, err).await,
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    Ok(Json(represent(&state, user).await?))
}

/// Serves both PUT and PATCH.
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUser>,
) -> Result<Response> {
    payload.validate()?;

    if state.users.find_by_id(id).await?.is_none() {
        return Err(AppError::DocumentNotFound);
    }
    if let Some(username) = payload.username.as_deref() {
        if state.users.username_exists(username, Some(id)).await? {
            return Ok(coded_reply(&state.messages, StatusCode::BAD_REQUEST, USERNAME_TAKEN).await);
        }
    }
    if let Some(email) = payload.email.as_deref() {
        if state.users.email_exists(email, Some(id)).await? {
            return Ok(coded_reply(&state.messages, StatusCode::BAD_REQUEST, EMAIL_TAKEN).await);
        }
    }

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password, state.config.bcrypt_cost)?),
        None => None,
    };

    let changes = UserChanges {
        role: parse_role(payload.role.as_deref())?,
        username: payload.username,
        email: payload.email,
        phone: payload.phone,
        first_name: payload.first_name,
        last_name: payload.last_name,
        is_active: payload.is_active,
        password_hash,
    };

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or(AppError::DocumentNotFound)?;
    tracing::info!("Admin {} <{}> updated user {}", admin.username, admin.email, user.id);

    Ok(Json(represent(&state, user).await?).into_response())
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if admin.id == id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    if !state.users.delete(id).await? {
        return Err(AppError::DocumentNotFound);
    }

    tracing::info!("Admin {} <{}> deleted user {}", admin.username, admin.email, id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<UserStats>> {
    Ok(Json(state.users.stats().await?))
}

pub async fn upsert_message(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((type_name, code)): Path<(String, String)>,
    Json(payload): Json<MessageText>,
) -> Result<Json<MessageRecord>> {
    payload.validate()?;

    let category = MessageCategory::from_type_name(&type_name)
        .ok_or_else(|| AppError::bad_request(format!("Unknown message type: {}", type_name)))?;

    let record = state.messages.upsert(category, &code, &payload.text).await?;
    tracing::info!(
        "Admin {} <{}> set {} message {}",
        admin.username,
        admin.email,
        category.as_str(),
        record.code
    );

    Ok(Json(record))
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>> {
    match raw {
        None => Ok(None),
        Some(raw) => Role::parse(raw)
            .map(Some)
            .ok_or_else(|| AppError::invalid_data(format!("Unknown role: {}", raw))),
    }
}
