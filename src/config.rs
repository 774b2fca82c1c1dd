// config.rs
use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub otp_expiry_minutes: i64,
    pub default_from_email: String,
    pub mail_api_url: Option<String>,
    pub mail_api_key: String,
    pub mail_timeout_secs: u64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
    pub log_level: tracing::Level,
    pub admin: Option<AdminBootstrap>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite://accounts.db?mode=rwc".to_string(),
            jwt_secret: "change-me-in-production".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 1,
            otp_expiry_minutes: 5,
            default_from_email: "noreply@example.com".to_string(),
            mail_api_url: None,
            mail_api_key: String::new(),
            mail_timeout_secs: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: tracing::Level::INFO,
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();

        let admin = match (
            env::var("ADMIN_USERNAME"),
            env::var("ADMIN_EMAIL"),
            env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(AdminBootstrap {
                username,
                email,
                password,
            }),
            _ => None,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .unwrap_or(defaults.jwt_secret);

        Ok(AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            access_token_minutes: parse_ranged("ACCESS_TOKEN_MINUTES", defaults.access_token_minutes, 1..=525_600)?,
            refresh_token_days: parse_ranged("REFRESH_TOKEN_DAYS", defaults.refresh_token_days, 1..=365)?,
            otp_expiry_minutes: parse_ranged("OTP_EXPIRY_MINUTES", defaults.otp_expiry_minutes, 1..=1440)?,
            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or(defaults.default_from_email),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|url| !url.is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_timeout_secs: parse_ranged("MAIL_TIMEOUT_SECS", defaults.mail_timeout_secs, 1..=300)?,
            bcrypt_cost: parse_ranged("BCRYPT_COST", defaults.bcrypt_cost, 4..=31)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_level: parse_var("LOG_LEVEL", defaults.log_level)?,
            admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::configuration(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_ranged<T>(key: &str, default: T, range: RangeInclusive<T>) -> Result<T>
where
    T: FromStr + PartialOrd + Display,
{
    let value = parse_var(key, default)?;
    if !range.contains(&value) {
        return Err(AppError::configuration(format!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value: i64 = parse_var("ACCOUNT_API_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("ACCOUNT_API_TEST_BAD_PORT", "not-a-port");
        let result: Result<u16> = parse_var("ACCOUNT_API_TEST_BAD_PORT", 8000);
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn otp_expiry_out_of_range_is_rejected() {
        env::set_var("ACCOUNT_API_TEST_OTP_NEGATIVE", "-5");
        let result: Result<i64> = parse_ranged("ACCOUNT_API_TEST_OTP_NEGATIVE", 5, 1..=1440);
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));

        env::set_var("ACCOUNT_API_TEST_OTP_HUGE", "9223372036854775807");
        let result: Result<i64> = parse_ranged("ACCOUNT_API_TEST_OTP_HUGE", 5, 1..=1440);
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));

        env::set_var("ACCOUNT_API_TEST_OTP_OK", "15");
        let value: i64 = parse_ranged("ACCOUNT_API_TEST_OTP_OK", 5, 1..=1440).unwrap();
        assert_eq!(value, 15);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.otp_expiry_minutes, 5);
        assert_eq!(config.default_from_email, "noreply@example.com");
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }
}
