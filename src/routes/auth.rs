use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::{admin, auth, messages, profile};
use crate::state::AppState;

/// Mounted under `/api/auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/token/", post(auth::token))
        .route("/token/refresh/", post(auth::token_refresh))
        .route("/check-username/", get(auth::check_username))
        .route("/check-email/", get(auth::check_email))
        .route(
            "/profile/",
            get(profile::get_profile)
                .put(profile::update_profile)
                .post(profile::update_profile),
        )

        // Admin
        .route("/admin/users/", get(admin::list_users).post(admin::create_user))
        .route(
            "/admin/users/:id/",
            get(admin::get_user)
                .put(admin::update_user)
                .patch(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/admin/stats/", get(admin::stats))
        .route("/admin/messages/:type/:code/", put(admin::upsert_message))

        // Message catalog
        .route("/messages/", get(messages::merged_tables))
        .route("/messages/db/", get(messages::db_tables))
        .route("/messages/resolve/:code/", get(messages::resolve))
        .route("/messages/:type/:code/", get(messages::message_detail))
        .route("/constants/", get(messages::constants))
}
