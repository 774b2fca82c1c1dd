use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::dtos::auth_dtos::ProfileUpdateRequest;
use crate::errors::{AppError, Result};
use crate::handlers::coded_reply;
use crate::middleware::auth::AuthUser;
use crate::models::user::{User, UserChanges, UserResponse};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "EP016";
const EMAIL_TAKEN: &str = "ES003";

pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .find_by_id(current.id)
        .await?
        .ok_or(AppError::AuthError)?;

    Ok(Json(represent(&state, user).await?))
}

/// Partial self-update. Role and activity flags are not reachable from here.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Response> {
    payload.validate()?;

    if let Some(username) = payload.username.as_deref() {
        if state.users.username_exists(username, Some(current.id)).await? {
            return Ok(coded_reply(&state.messages, StatusCode::BAD_REQUEST, USERNAME_TAKEN).await);
        }
    }
    if let Some(email) = payload.email.as_deref() {
        if state.users.email_exists(email, Some(current.id)).await? {
            return Ok(coded_reply(&state.messages, StatusCode::BAD_REQUEST, EMAIL_TAKEN).await);
        }
    }

    let changes = UserChanges {
        username: payload.username,
        email: payload.email,
        phone: payload.phone,
        first_name: payload.first_name,
        last_name: payload.last_name,
        ..Default::default()
    };

    let user = state
        .users
        .update(current.id, changes)
        .await?
        .ok_or(AppError::AuthError)?;
    tracing::info!("Profile updated for user {}", user.id);

    Ok(Json(represent(&state, user).await?).into_response())
}

/// User representation with the first address attached (or `{}`).
pub(crate) async fn represent(state: &AppState, user: User) -> Result<UserResponse> {
    let address = state.addresses.first_for_user(user.id).await?;
    Ok(UserResponse::new(user, address))
}
