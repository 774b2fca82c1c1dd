use serde::Deserialize;
use validator::Validate;

use crate::dtos::trimmed_opt;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminCreateUser {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

impl AdminCreateUser {
    pub fn has_required_fields(&self) -> bool {
        [&self.username, &self.email, &self.phone, &self.password]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// PUT and PATCH share this shape; absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUpdateUser {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MessageText {
    #[validate(length(min = 1, message = "Message text is required"))]
    pub text: String,
}
