use axum::{routing::get, Router};

use crate::handlers::addresses;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/addresses/check_address/", get(addresses::check_address))
        .route("/api/addresses/check/", get(addresses::check_address))
        .route("/api/addresses/me/", get(addresses::my_address))
        .route(
            "/api/addresses/",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/api/addresses/:id/",
            get(addresses::get_address)
                .put(addresses::update_address)
                .patch(addresses::update_address),
        )
}
