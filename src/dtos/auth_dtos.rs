use serde::Deserialize;
use validator::Validate;

use crate::dtos::{trimmed, trimmed_opt};

/// Every field optional so a missing one maps to `EV001` instead of a
/// deserialization rejection.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegisterRequest {
    pub fn has_required_fields(&self) -> bool {
        [&self.username, &self.email, &self.phone, &self.password]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Both credentials, or `None` when either is blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.is_empty())?;
        Some((username, password))
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(email)]
    pub email: String,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub new_password: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub confirm_password: String,
}

impl VerifyOtpRequest {
    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok() && self.otp.chars().all(|c| c.is_ascii_digit())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
