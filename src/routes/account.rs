use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{change_password, profile};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/change-password/", post(change_password::change_password))
        .route("/api/viewprofile/", get(profile::get_profile))
}
