use axum::{routing::post, Router};

use crate::handlers::password_reset;
use crate::state::AppState;

/// Mounted under `/api/password-reset`.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Request OTP
        .route("/send-otp/", post(password_reset::send_otp))
        // Verify OTP and set the new password
        .route("/verify-otp/", post(password_reset::verify_otp))
}
