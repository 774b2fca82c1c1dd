use axum::{
    extract::State,
    http::Method,
    middleware::from_fn_with_state,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub mod account;
pub mod addresses;
pub mod auth;
pub mod password_reset;

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .nest("/api/auth", auth::routes())
        .nest("/api/password-reset", password_reset::routes())
        .merge(addresses::routes())
        .merge(account::routes())
        .layer(from_fn_with_state(app_state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Account API",
        "endpoints": {
            "auth": "/api/auth/",
            "password_reset": "/api/password-reset/",
            "change_password": "/api/change-password/",
            "profile": "/api/viewprofile/",
            "addresses": "/api/addresses/",
            "health": "/health",
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
