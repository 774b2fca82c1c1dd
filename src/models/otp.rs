use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OtpRow {
    pub email: String,
    pub otp_code: String,
    pub expiry_time: i64, // unix millis
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OtpRecord {
    pub email: String,
    pub otp_code: String,
    pub expiry_time: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time < now
    }

    pub fn matches(&self, otp: &str) -> bool {
        self.otp_code.trim() == otp.trim()
    }
}

impl From<OtpRow> for OtpRecord {
    fn from(row: OtpRow) -> Self {
        OtpRecord {
            email: row.email,
            otp_code: row.otp_code,
            expiry_time: Utc
                .timestamp_millis_opt(row.expiry_time)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}
