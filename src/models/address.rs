use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Address {
    pub id: i64,
    pub house_flat: String,
    pub street: String,
    pub landmark: Option<String>,
    pub area: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated address fields, ready to insert or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFields {
    pub house_flat: String,
    pub street: String,
    pub landmark: Option<String>,
    pub area: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
