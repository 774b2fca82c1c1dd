use axum::{extract::State, http::StatusCode, response::Response, Json};
use validator::Validate;

use crate::dtos::auth_dtos::{SendOtpRequest, VerifyOtpRequest};
use crate::handlers::coded_reply;
use crate::services::otp_service::{PasswordResetError, ResetRequest, OTP_SENT, PASSWORD_RESET};
use crate::state::AppState;

const INVALID_EMAIL: &str = "VA005";
const INVALID_RESET_INPUT: &str = "VA004";

// 1. Request a code
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Response {
    if req.validate().is_err() {
        return coded_reply(&state.messages, StatusCode::BAD_REQUEST, INVALID_EMAIL).await;
    }

    match state.otp_service.send_otp(&req.email).await {
        Ok(()) => coded_reply(&state.messages, StatusCode::OK, OTP_SENT).await,
        Err(err) => coded_reply(&state.messages, err.status_code(), err.message_code()).await,
    }
}

// 2. Verify the code and set the new password
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Response {
    if !req.is_well_formed() {
        return coded_reply(&state.messages, StatusCode::BAD_REQUEST, INVALID_RESET_INPUT).await;
    }

    let request = ResetRequest {
        email: req.email,
        otp: req.otp,
        new_password: req.new_password,
        confirm_password: req.confirm_password,
    };

    match state.otp_service.verify_otp(request).await {
        Ok(()) => coded_reply(&state.messages, StatusCode::OK, PASSWORD_RESET).await,
        // The account vanished between issue and verify; not a lookup miss.
        Err(PasswordResetError::EmailNotRegistered) => {
            let err = PasswordResetError::EmailNotRegistered;
            coded_reply(&state.messages, StatusCode::BAD_REQUEST, err.message_code()).await
        }
        Err(err) => coded_reply(&state.messages, err.status_code(), err.message_code()).await,
    }
}
