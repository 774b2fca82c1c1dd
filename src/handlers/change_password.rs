use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::dtos::auth_dtos::ChangePasswordRequest;
use crate::errors::{AppError, Result};
use crate::handlers::field_errors_reply;
use crate::middleware::auth::AuthUser;
use crate::services::user_service::ChangePasswordError;
use crate::state::AppState;

const PASSWORD_CHANGED: &str = "ICP001";

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    let user = state
        .users
        .find_by_id(current.id)
        .await?
        .ok_or(AppError::AuthError)?;

    let outcome = state
        .users
        .change_password(
            &user,
            &payload.old_password,
            &payload.new_password,
            &payload.confirm_password,
            state.config.bcrypt_cost,
        )
        .await;

    match outcome {
        Ok(()) => {
            let detail = state.messages.text(PASSWORD_CHANGED).await;
            Ok(Json(json!({ "detail": detail })).into_response())
        }
        Err(ChangePasswordError::Internal(e)) => Err(e),
        Err(err) => Ok(field_errors_reply(&state.messages, &[(err.field(), err.message_code())]).await),
    }
}
