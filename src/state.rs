use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::address_service::AddressService;
use crate::services::mail_service::Mailer;
use crate::services::message_service::MessageResolver;
use crate::services::otp_service::OTPService;
use crate::services::token_service::TokenService;
use crate::services::user_service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub messages: MessageResolver,
    pub users: UserService,
    pub addresses: AddressService,
    pub otp_service: OTPService,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        let otp_service = OTPService::new(
            db.clone(),
            mailer,
            config.otp_expiry_minutes,
            config.bcrypt_cost,
        );
        let tokens = TokenService::new(
            config.jwt_secret.clone(),
            config.access_token_minutes,
            config.refresh_token_days,
        );

        AppState {
            messages: MessageResolver::new(db.clone()),
            users: UserService::new(db.clone()),
            addresses: AddressService::new(db.clone()),
            otp_service,
            tokens,
            config: Arc::new(config),
            db,
        }
    }
}
