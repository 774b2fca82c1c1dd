use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::dtos::auth_dtos::{
    EmailQuery, LoginRequest, RegisterRequest, TokenRefreshRequest, UsernameQuery,
};
use crate::errors::{AppError, Result};
use crate::handlers::coded_reply;
use crate::models::user::{normalize_email, Role, TokenType};
use crate::services::token_service::TokenService;
use crate::services::user_service::{Registration, RegistrationError};
use crate::state::AppState;

const LOGIN_SUCCESS: &str = "IL001";
const LOGIN_FAILED: &str = "EL001";
const REGISTERED: &str = "IR001";

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    if !payload.has_required_fields() {
        return registration_failed(&state, RegistrationError::MissingFields).await;
    }
    if payload.validate().is_err() {
        return registration_failed(&state, RegistrationError::InvalidEmail).await;
    }

    let registration = Registration {
        username: payload.username.unwrap_or_default().trim().to_string(),
        email: normalize_email(&payload.email.unwrap_or_default()),
        phone: payload.phone.map(|phone| phone.trim().to_string()),
        password: payload.password.unwrap_or_default(),
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        role: Role::User,
    };

    match state.users.register(registration, state.config.bcrypt_cost).await {
        Ok(user) => {
            tracing::info!("Registered user {}", user.username);
            Ok(coded_reply(&state.messages, StatusCode::CREATED, REGISTERED).await)
        }
        Err(err) => registration_failed(&state, err).await,
    }
}

/// Coded 400 for anything the caller can fix; infrastructure faults propagate.
pub(crate) async fn registration_failed(
    state: &AppState,
    err: RegistrationError,
) -> Result<Response> {
    match err {
        RegistrationError::Internal(e) => Err(e),
        other => Ok(coded_reply(&state.messages, StatusCode::BAD_REQUEST, other.message_code()).await),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let Some((username, password)) = payload.credentials() else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "code": LOGIN_FAILED,
                "message": "Username and password are required",
            })),
        )
            .into_response());
    };

    let Some(user) = state.users.authenticate(username, password).await? else {
        let msg = state.messages.resolve(LOGIN_FAILED).await;
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "error",
                "code": msg.code,
                "message": msg.message,
            })),
        )
            .into_response());
    };

    let pair = state.tokens.issue_pair(&user)?;
    let msg = state.messages.resolve(LOGIN_SUCCESS).await;
    tracing::info!("User {} logged in", user.username);

    Ok(Json(json!({
        "status": "success",
        "code": msg.code,
        "message": msg.message,
        "access": pair.access,
        "refresh": pair.refresh,
        "username": user.username,
        "email": user.email,
        "is_admin": user.is_admin(),
    }))
    .into_response())
}

/// Token pair plus identity flags for clients that bootstrap from the token call.
pub async fn token(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>> {
    let (username, password) = payload.credentials().ok_or(AppError::AuthError)?;
    let user = state
        .users
        .authenticate(username, password)
        .await?
        .ok_or(AppError::AuthError)?;

    let pair = state.tokens.issue_pair(&user)?;
    let is_admin = user.is_admin();

    Ok(Json(json!({
        "access": pair.access,
        "refresh": pair.refresh,
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "is_superuser": is_admin,
        "is_staff": is_admin,
        "is_admin": is_admin,
    })))
}

pub async fn token_refresh(
    State(state): State<AppState>,
    Json(payload): Json<TokenRefreshRequest>,
) -> Result<Json<serde_json::Value>> {
    let claims = state
        .tokens
        .decode(&payload.refresh, TokenType::Refresh)
        .map_err(|_| AppError::AuthError)?;
    let user_id = TokenService::user_id(&claims)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AppError::AuthError)?;

    let access = state.tokens.issue(&user, TokenType::Access)?;
    Ok(Json(json!({ "access": access })))
}

pub async fn check_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Response> {
    let username = query.username.unwrap_or_default();
    let username = username.trim();
    if username.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "username query param required" })),
        )
            .into_response());
    }

    let exists = state.users.username_exists(username, None).await?;
    Ok(Json(json!({ "exists": exists })).into_response())
}

pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Response> {
    let email = query.email.unwrap_or_default();
    if email.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "email query param required" })),
        )
            .into_response());
    }

    let exists = state.users.email_exists(&email, None).await?;
    Ok(Json(json!({ "exists": exists })).into_response())
}
