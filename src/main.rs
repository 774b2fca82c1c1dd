use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::get_db_pool;
use services::mail_service::{HttpMailer, LogMailer, Mailer};
use services::user_service::UserService;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    if config.jwt_secret == AppConfig::default().jwt_secret {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let db = get_db_pool(&config.database_url)
        .await
        .context("failed to open the database")?;

    if let Some(admin) = &config.admin {
        UserService::new(db.clone())
            .ensure_admin(admin, config.bcrypt_cost)
            .await
            .context("failed to bootstrap the admin account")?;
    }

    let mailer = init_mailer(&config).context("failed to set up the mailer")?;
    let addr = config.bind_address();
    let app = routes::build_router(AppState::new(db, config, mailer));

    tracing::info!("Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_mailer(config: &AppConfig) -> errors::Result<Arc<dyn Mailer>> {
    match &config.mail_api_url {
        Some(url) => {
            tracing::info!("Sending mail through {}", url);
            Ok(Arc::new(HttpMailer::new(
                url.clone(),
                config.mail_api_key.clone(),
                config.default_from_email.clone(),
                Duration::from_secs(config.mail_timeout_secs),
            )?))
        }
        None => {
            tracing::warn!("MAIL_API_URL not set, outgoing mail will only be logged");
            Ok(Arc::new(LogMailer::new(config.default_from_email.clone())))
        }
    }
}
