use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::models::otp::{OtpRecord, OtpRow};
use crate::models::user::normalize_email;
use crate::services::mail_service::Mailer;
use crate::services::password::hash_password;
use crate::services::user_service::{set_password_hash, UserService};

pub const OTP_SENT: &str = "IFP001";
pub const PASSWORD_RESET: &str = "IFP002";

/// Every way a reset request can end short of success.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordResetError {
    #[error("email is not registered")]
    EmailNotRegistered,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("verification code is invalid or missing")]
    InvalidOrMissingCode,

    #[error("verification code has expired")]
    SessionExpired,

    #[error("password could not be updated")]
    PasswordUpdateFailed,

    #[error("unexpected error")]
    Unexpected,
}

impl PasswordResetError {
    pub fn message_code(&self) -> &'static str {
        match self {
            PasswordResetError::EmailNotRegistered => "EF001",
            PasswordResetError::PasswordMismatch => "EF003",
            PasswordResetError::SessionExpired => "EF004",
            PasswordResetError::InvalidOrMissingCode => "EF005",
            PasswordResetError::PasswordUpdateFailed => "EF006",
            PasswordResetError::Unexpected => "EA010",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PasswordResetError::EmailNotRegistered => StatusCode::NOT_FOUND,
            PasswordResetError::PasswordMismatch
            | PasswordResetError::InvalidOrMissingCode
            | PasswordResetError::SessionExpired => StatusCode::BAD_REQUEST,
            PasswordResetError::PasswordUpdateFailed | PasswordResetError::Unexpected => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResetRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Clone)]
pub struct OTPService {
    db: SqlitePool,
    users: UserService,
    mailer: Arc<dyn Mailer>,
    ttl_minutes: i64,
    bcrypt_cost: u32,
}

impl OTPService {
    pub fn new(
        db: SqlitePool,
        mailer: Arc<dyn Mailer>,
        ttl_minutes: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users: UserService::new(db.clone()),
            db,
            mailer,
            ttl_minutes,
            bcrypt_cost,
        }
    }

    // Generate 6-digit OTP
    pub fn generate_otp() -> String {
        let mut rng = rand::thread_rng();
        format!("{:06}", rng.gen_range(0..1_000_000))
    }

    /// Issues a fresh code for a registered email, replacing any earlier one.
    /// The row is only committed once the mail has gone out.
    pub async fn send_otp(&self, email: &str) -> Result<(), PasswordResetError> {
        let email = normalize_email(email);
        tracing::info!("OTP requested for {}", email);

        let registered = self.users.find_by_email(&email).await.map_err(|e| {
            tracing::error!("User lookup failed for {}: {}", email, e);
            PasswordResetError::Unexpected
        })?;
        if registered.is_none() {
            return Err(PasswordResetError::EmailNotRegistered);
        }

        let otp = Self::generate_otp();
        let expiry = Utc::now() + Duration::minutes(self.ttl_minutes);

        let mut tx = self.db.begin().await.map_err(|e| {
            tracing::error!("Could not open transaction for OTP issue: {}", e);
            PasswordResetError::Unexpected
        })?;

        store_otp(&mut tx, &email, &otp, expiry).await.map_err(|e| {
            tracing::error!("Failed to store OTP for {}: {}", email, e);
            PasswordResetError::Unexpected
        })?;

        let body = format!(
            "Your verification code is: {}\nThis code expires in {} minutes.",
            otp, self.ttl_minutes
        );
        if let Err(e) = self.mailer.send(&email, "Your Verification Code", &body).await {
            // Dropping `tx` rolls the upsert back.
            tracing::error!("Failed to send OTP email to {}: {}", email, e);
            return Err(PasswordResetError::Unexpected);
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit OTP for {}: {}", email, e);
            PasswordResetError::Unexpected
        })?;

        Ok(())
    }

    /// Checks the code and, if it holds, swaps the password and consumes the code.
    pub async fn verify_otp(&self, request: ResetRequest) -> Result<(), PasswordResetError> {
        if request.new_password != request.confirm_password {
            return Err(PasswordResetError::PasswordMismatch);
        }

        let email = normalize_email(&request.email);

        let record = self
            .latest_otp(&email)
            .await
            .map_err(|e| {
                tracing::error!("OTP lookup failed for {}: {}", email, e);
                PasswordResetError::Unexpected
            })?
            .ok_or(PasswordResetError::InvalidOrMissingCode)?;

        if record.is_expired(Utc::now()) {
            if let Err(e) = self.delete_otps(&email).await {
                tracing::error!("Failed to discard expired OTP for {}: {}", email, e);
            }
            return Err(PasswordResetError::SessionExpired);
        }

        if !record.matches(&request.otp) {
            tracing::warn!("Invalid OTP submitted for {}", email);
            return Err(PasswordResetError::InvalidOrMissingCode);
        }

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| {
                tracing::error!("User lookup failed for {}: {}", email, e);
                PasswordResetError::Unexpected
            })?
            .ok_or(PasswordResetError::EmailNotRegistered)?;

        self.reset_password(user.id, &email, &request.new_password)
            .await
            .map_err(|e| {
                tracing::error!("Failed to reset password for {}: {}", email, e);
                PasswordResetError::PasswordUpdateFailed
            })?;

        tracing::info!("Password reset completed for {}", email);
        Ok(())
    }

    /// Most recently issued code for the email (greatest expiry wins).
    pub async fn latest_otp(&self, email: &str) -> Result<Option<OtpRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, OtpRow>(
            "SELECT email, otp_code, expiry_time FROM otp_codes \
             WHERE LOWER(TRIM(email)) = ? ORDER BY expiry_time DESC LIMIT 1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(OtpRecord::from))
    }

    async fn delete_otps(&self, email: &str) -> Result<u64, sqlx::Error> {
        let mut conn = self.db.acquire().await?;
        delete_otps(&mut conn, email).await
    }

    async fn reset_password(
        &self,
        user_id: i64,
        email: &str,
        new_password: &str,
    ) -> crate::errors::Result<()> {
        let password_hash = hash_password(new_password, self.bcrypt_cost)?;

        let mut tx = self.db.begin().await?;
        let updated = set_password_hash(&mut tx, user_id, &password_hash).await?;
        if updated == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        delete_otps(&mut tx, email).await?;
        tx.commit().await?;

        Ok(())
    }
}

/// Upsert keyed by the normalized email.
pub async fn store_otp(
    conn: &mut SqliteConnection,
    email: &str,
    otp: &str,
    expiry: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO otp_codes (email, otp_code, expiry_time) VALUES (?, ?, ?) \
         ON CONFLICT(email) DO UPDATE SET \
            otp_code = excluded.otp_code, \
            expiry_time = excluded.expiry_time",
    )
    .bind(normalize_email(email))
    .bind(otp)
    .bind(expiry.timestamp_millis())
    .execute(conn)
    .await?;

    Ok(())
}

async fn delete_otps(conn: &mut SqliteConnection, email: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM otp_codes WHERE LOWER(TRIM(email)) = ?")
        .bind(normalize_email(email))
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connection::test_pool;
    use crate::models::user::Role;
    use crate::services::mail_service::testing::{FailingMailer, RecordingMailer};
    use crate::services::password::verify_password;
    use crate::services::user_service::testing::seed_user;

    struct Fixture {
        db: SqlitePool,
        users: UserService,
        mailer: Arc<RecordingMailer>,
        service: OTPService,
    }

    async fn fixture() -> Fixture {
        let db = test_pool().await;
        let users = UserService::new(db.clone());
        seed_user(&users, "user", "USER@Example.com", Role::User).await;

        let mailer = Arc::new(RecordingMailer::default());
        let service = OTPService::new(db.clone(), mailer.clone(), 5, 4);

        Fixture {
            db,
            users,
            mailer,
            service,
        }
    }

    fn code_from_mail(body: &str) -> String {
        body.split("code is: ").nth(1).unwrap()[..6].to_string()
    }

    async fn put_otp(db: &SqlitePool, email: &str, otp: &str, expiry: DateTime<Utc>) {
        let mut conn = db.acquire().await.unwrap();
        store_otp(&mut conn, email, otp, expiry).await.unwrap();
    }

    async fn otp_rows(db: &SqlitePool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM otp_codes")
            .fetch_one(db)
            .await
            .unwrap();
        count
    }

    fn reset(email: &str, otp: &str, new_password: &str, confirm: &str) -> ResetRequest {
        ResetRequest {
            email: email.to_string(),
            otp: otp.to_string(),
            new_password: new_password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let otp = OTPService::generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn second_issue_replaces_first() {
        let f = fixture().await;

        f.service.send_otp("user@example.com").await.unwrap();
        let before = Utc::now();
        f.service.send_otp("  User@Example.com ").await.unwrap();

        assert_eq!(otp_rows(&f.db).await, 1);
        assert_eq!(f.mailer.count(), 2);

        let mail = f.mailer.last().unwrap();
        assert_eq!(mail.to, "user@example.com");
        assert!(mail.body.contains("expires in 5 minutes"));

        let record = f.service.latest_otp("user@example.com").await.unwrap().unwrap();
        assert_eq!(record.otp_code, code_from_mail(&mail.body));
        assert!(record.expiry_time > before + Duration::minutes(4));
    }

    #[tokio::test]
    async fn unregistered_email_is_rejected_without_mail() {
        let f = fixture().await;

        let result = f.service.send_otp("nobody@example.com").await;
        assert_eq!(result, Err(PasswordResetError::EmailNotRegistered));
        assert_eq!(f.mailer.count(), 0);
        assert_eq!(otp_rows(&f.db).await, 0);
    }

    #[tokio::test]
    async fn mail_failure_leaves_no_record() {
        let f = fixture().await;
        let service = OTPService::new(f.db.clone(), Arc::new(FailingMailer), 5, 4);

        let result = service.send_otp("user@example.com").await;
        assert_eq!(result, Err(PasswordResetError::Unexpected));
        assert_eq!(otp_rows(&f.db).await, 0);
    }

    #[tokio::test]
    async fn mail_failure_keeps_the_previous_code() {
        let f = fixture().await;
        put_otp(&f.db, "user@example.com", "111111", Utc::now() + Duration::minutes(5)).await;

        let service = OTPService::new(f.db.clone(), Arc::new(FailingMailer), 5, 4);
        assert!(service.send_otp("user@example.com").await.is_err());

        let record = f.service.latest_otp("user@example.com").await.unwrap().unwrap();
        assert_eq!(record.otp_code, "111111");
    }

    #[tokio::test]
    async fn matching_code_resets_password_and_consumes_record() {
        let f = fixture().await;
        f.service.send_otp("user@example.com").await.unwrap();
        let otp = code_from_mail(&f.mailer.last().unwrap().body);
        let old_hash = f.users.find_by_email("user@example.com").await.unwrap().unwrap().password_hash;

        f.service
            .verify_otp(reset("user@example.com", &otp, "brand-new-pass", "brand-new-pass"))
            .await
            .unwrap();

        let user = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, old_hash);
        assert!(verify_password("brand-new-pass", &user.password_hash));
        assert_eq!(otp_rows(&f.db).await, 0);
    }

    #[tokio::test]
    async fn expired_code_is_deleted_and_then_missing() {
        let f = fixture().await;
        put_otp(&f.db, "user@example.com", "123456", Utc::now() - Duration::minutes(1)).await;

        let first = f
            .service
            .verify_otp(reset("user@example.com", "123456", "brand-new-pass", "brand-new-pass"))
            .await;
        assert_eq!(first, Err(PasswordResetError::SessionExpired));
        assert_eq!(otp_rows(&f.db).await, 0);

        let second = f
            .service
            .verify_otp(reset("user@example.com", "123456", "brand-new-pass", "brand-new-pass"))
            .await;
        assert_eq!(second, Err(PasswordResetError::InvalidOrMissingCode));
    }

    #[tokio::test]
    async fn password_mismatch_leaves_record_for_retry() {
        let f = fixture().await;
        put_otp(&f.db, "user@example.com", "654321", Utc::now() + Duration::minutes(5)).await;

        let mismatch = f
            .service
            .verify_otp(reset("user@example.com", "654321", "brand-new-pass", "brand-new-pas"))
            .await;
        assert_eq!(mismatch, Err(PasswordResetError::PasswordMismatch));
        assert_eq!(otp_rows(&f.db).await, 1);

        f.service
            .verify_otp(reset("user@example.com", "654321", "brand-new-pass", "brand-new-pass"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wrong_code_keeps_record() {
        let f = fixture().await;
        put_otp(&f.db, "user@example.com", "654321", Utc::now() + Duration::minutes(5)).await;

        let result = f
            .service
            .verify_otp(reset("user@example.com", "000000", "brand-new-pass", "brand-new-pass"))
            .await;
        assert_eq!(result, Err(PasswordResetError::InvalidOrMissingCode));
        assert_eq!(otp_rows(&f.db).await, 1);
    }

    #[tokio::test]
    async fn missing_code_is_invalid() {
        let f = fixture().await;

        let result = f
            .service
            .verify_otp(reset("user@example.com", "123456", "brand-new-pass", "brand-new-pass"))
            .await;
        assert_eq!(result, Err(PasswordResetError::InvalidOrMissingCode));
    }

    #[tokio::test]
    async fn untrimmed_case_variant_email_verifies() {
        let f = fixture().await;
        put_otp(&f.db, "USER@Example.com", "048213", Utc::now() + Duration::minutes(5)).await;

        f.service
            .verify_otp(reset("user@example.com  ", "048213", "brand-new-pass", "brand-new-pass"))
            .await
            .unwrap();

        let user = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        assert!(verify_password("brand-new-pass", &user.password_hash));
    }

    #[tokio::test]
    async fn legacy_duplicate_rows_use_latest_expiry() {
        let f = fixture().await;
        let earlier = Utc::now() + Duration::minutes(2);
        let later = Utc::now() + Duration::minutes(4);

        // Case and whitespace variants slip past UNIQUE(email).
        sqlx::query("INSERT INTO otp_codes (email, otp_code, expiry_time) VALUES (?, ?, ?), (?, ?, ?)")
            .bind("user@example.com")
            .bind("111111")
            .bind(earlier.timestamp_millis())
            .bind(" USER@Example.com")
            .bind("222222")
            .bind(later.timestamp_millis())
            .execute(&f.db)
            .await
            .unwrap();
        assert_eq!(otp_rows(&f.db).await, 2);

        let latest = f.service.latest_otp("user@example.com").await.unwrap().unwrap();
        assert_eq!(latest.otp_code, "222222");

        let err = f
            .service
            .verify_otp(reset("user@example.com", "111111", "brand-new-pass", "brand-new-pass"))
            .await
            .unwrap_err();
        assert_eq!(err, PasswordResetError::InvalidOrMissingCode);
        assert_eq!(otp_rows(&f.db).await, 2);

        f.service
            .verify_otp(reset("user@example.com", "222222", "brand-new-pass", "brand-new-pass"))
            .await
            .unwrap();
        assert_eq!(otp_rows(&f.db).await, 0);

        let user = f.users.find_by_email("user@example.com").await.unwrap().unwrap();
        assert!(verify_password("brand-new-pass", &user.password_hash));
    }

    #[test]
    fn outcomes_map_to_catalog_codes() {
        assert_eq!(PasswordResetError::EmailNotRegistered.message_code(), "EF001");
        assert_eq!(PasswordResetError::SessionExpired.message_code(), "EF004");
        assert_eq!(
            PasswordResetError::PasswordUpdateFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
