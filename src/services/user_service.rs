use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::config::AdminBootstrap;
use crate::errors::{AppError, Result};
use crate::models::user::{normalize_email, NewUser, Role, User, UserChanges, UserStats};
use crate::services::password::{hash_password, is_strong_enough, verify_password};

/// Account fields as submitted, before hashing.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("required fields are missing")]
    MissingFields,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("email is already registered")]
    EmailTaken,

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl RegistrationError {
    pub fn message_code(&self) -> &'static str {
        match self {
            RegistrationError::MissingFields => "EV001",
            RegistrationError::InvalidEmail => "VA005",
            RegistrationError::UsernameTaken => "EV002",
            RegistrationError::EmailTaken => "ES003",
            RegistrationError::Internal(_) => "EA010",
        }
    }
}

/// Change-password refusals, each tied to the form field it concerns.
#[derive(Error, Debug)]
pub enum ChangePasswordError {
    #[error("old password is incorrect")]
    WrongOldPassword,

    #[error("new passwords do not match")]
    Mismatch,

    #[error("new password is too weak")]
    TooWeak,

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl ChangePasswordError {
    pub fn field(&self) -> &'static str {
        match self {
            ChangePasswordError::WrongOldPassword => "old_password",
            ChangePasswordError::Mismatch => "confirm_password",
            ChangePasswordError::TooWeak => "new_password",
            ChangePasswordError::Internal(_) => "detail",
        }
    }

    pub fn message_code(&self) -> &'static str {
        match self {
            ChangePasswordError::WrongOldPassword => "EC001",
            ChangePasswordError::Mismatch => "EC002",
            ChangePasswordError::TooWeak => "VP001",
            ChangePasswordError::Internal(_) => "EA010",
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, phone, first_name, last_name, \
                            password_hash, role, is_active, date_joined";

#[derive(Clone)]
pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users \
             (username, email, phone, first_name, last_name, password_hash, role, is_active, date_joined) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(new_user.username.trim())
        .bind(normalize_email(&new_user.email))
        .bind(&new_user.phone)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        let user = self
            .find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Uniqueness checks then insert. Fields are assumed present and well formed.
    pub async fn register(
        &self,
        registration: Registration,
        bcrypt_cost: u32,
    ) -> std::result::Result<User, RegistrationError> {
        if self.username_exists(&registration.username, None).await? {
            return Err(RegistrationError::UsernameTaken);
        }
        if self.email_exists(&registration.email, None).await? {
            return Err(RegistrationError::EmailTaken);
        }

        let password_hash = hash_password(&registration.password, bcrypt_cost)?;
        let user = self
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                phone: registration.phone,
                first_name: registration.first_name,
                last_name: registration.last_name,
                password_hash,
                role: registration.role,
            })
            .await?;
        Ok(user)
    }

    /// Creates the configured administrator unless the username or email is already taken.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap, bcrypt_cost: u32) -> Result<bool> {
        let registration = Registration {
            username: admin.username.trim().to_string(),
            email: normalize_email(&admin.email),
            phone: None,
            password: admin.password.clone(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Admin,
        };

        match self.register(registration, bcrypt_cost).await {
            Ok(user) => {
                tracing::info!("Bootstrapped admin account {}", user.username);
                Ok(true)
            }
            Err(RegistrationError::Internal(e)) => Err(e),
            Err(e) => {
                tracing::debug!("Admin bootstrap skipped: {}", e);
                Ok(false)
            }
        }
    }

    /// Username + password check. Inactive accounts never authenticate.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        if !user.is_active || !verify_password(password, &user.password_hash) {
            tracing::info!("Rejected login for {}", username);
            return Ok(None);
        }

        Ok(Some(user))
    }

    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
        bcrypt_cost: u32,
    ) -> std::result::Result<(), ChangePasswordError> {
        if !verify_password(old_password, &user.password_hash) {
            return Err(ChangePasswordError::WrongOldPassword);
        }
        if new_password != confirm_password {
            return Err(ChangePasswordError::Mismatch);
        }
        if !is_strong_enough(new_password, &user.username) {
            return Err(ChangePasswordError::TooWeak);
        }

        let password_hash = hash_password(new_password, bcrypt_cost)?;
        let mut conn = self.db.acquire().await.map_err(AppError::from)?;
        set_password_hash(&mut conn, user.id, &password_hash)
            .await
            .map_err(AppError::from)?;

        tracing::info!("Password changed for user {}", user.id);
        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    /// Usernames compare case-insensitively (column collation).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.db)
            .await?)
    }

    /// Trimmed, case-insensitive match on both sides.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(TRIM(email)) = ? LIMIT 1",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.db)
            .await?)
    }

    pub async fn username_exists(&self, username: &str, except: Option<i64>) -> Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? AND id != ?")
                .bind(username.trim())
                .bind(except.unwrap_or(-1))
                .fetch_one(&self.db)
                .await?;
        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str, except: Option<i64>) -> Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE LOWER(TRIM(email)) = ? AND id != ?")
                .bind(normalize_email(email))
                .bind(except.unwrap_or(-1))
                .fetch_one(&self.db)
                .await?;
        Ok(count > 0)
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?)
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>> {
        let result = sqlx::query(
            "UPDATE users SET \
                username = COALESCE(?, username), \
                email = COALESCE(?, email), \
                phone = COALESCE(?, phone), \
                first_name = COALESCE(?, first_name), \
                last_name = COALESCE(?, last_name), \
                role = COALESCE(?, role), \
                is_active = COALESCE(?, is_active), \
                password_hash = COALESCE(?, password_hash) \
             WHERE id = ?",
        )
        .bind(changes.username.as_deref().map(str::trim))
        .bind(changes.email.as_deref().map(normalize_email))
        .bind(changes.phone)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.role.map(|role| role.as_str()))
        .bind(changes.is_active)
        .bind(changes.password_hash)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&self) -> Result<UserStats> {
        let (total_users, active_users): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_active THEN 1 ELSE 0 END), 0) FROM users",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(UserStats {
            total_users,
            active_users,
            hold_users: total_users - active_users,
        })
    }
}

/// Runs on a caller-owned connection so it can join a transaction.
pub async fn set_password_hash(
    conn: &mut SqliteConnection,
    user_id: i64,
    password_hash: &str,
) -> std::result::Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}


#[cfg(test)]
mod tests {
    use super::testing::seed_user;
    use super::*;
    use crate::database::connection::test_pool;
    use crate::models::user::Role;

    #[tokio::test]
    async fn create_normalizes_email() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "alice", "  Alice@Example.COM ", Role::User).await;

        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active);
        assert!(users.find_by_email("ALICE@example.com  ").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn availability_checks_ignore_case_and_self() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "Bob", "bob@example.com", Role::User).await;

        assert!(users.username_exists("BOB", None).await.unwrap());
        assert!(!users.username_exists("bob", Some(user.id)).await.unwrap());
        assert!(users.email_exists("Bob@Example.com", None).await.unwrap());
        assert!(!users.email_exists("carol@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_columns() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "dave", "dave@example.com", Role::User).await;

        let updated = users
            .update(
                user.id,
                UserChanges {
                    first_name: Some("Dave".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.first_name, "Dave");
        assert_eq!(updated.username, "dave");
        assert!(!updated.is_active);
        assert!(users.update(9999, UserChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_split_active_and_held() {
        let users = UserService::new(test_pool().await);
        seed_user(&users, "u1", "u1@example.com", Role::User).await;
        let held = seed_user(&users, "u2", "u2@example.com", Role::User).await;
        users
            .update(
                held.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = users.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
        assert_eq!(stats.hold_users, 1);
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            phone: Some("9876543210".to_string()),
            password: "correct-horse".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn register_rejects_taken_username_then_email() {
        let users = UserService::new(test_pool().await);
        users.register(registration("frank", "frank@example.com"), 4).await.unwrap();

        let err = users
            .register(registration("FRANK", "other@example.com"), 4)
            .await
            .unwrap_err();
        assert_eq!(err.message_code(), "EV002");

        let err = users
            .register(registration("frankie", " Frank@Example.com"), 4)
            .await
            .unwrap_err();
        assert_eq!(err.message_code(), "ES003");
    }

    #[tokio::test]
    async fn authenticate_skips_inactive_accounts() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "gina", "gina@example.com", Role::User).await;

        assert!(users.authenticate("gina", "initial-pass").await.unwrap().is_some());
        assert!(users.authenticate("gina", "wrong-pass").await.unwrap().is_none());

        users
            .update(
                user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(users.authenticate("gina", "initial-pass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn change_password_checks_in_order() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "hank", "hank@example.com", Role::User).await;

        let err = users
            .change_password(&user, "nope", "brand-new-pass", "brand-new-pass", 4)
            .await
            .unwrap_err();
        assert_eq!((err.field(), err.message_code()), ("old_password", "EC001"));

        let err = users
            .change_password(&user, "initial-pass", "brand-new-pass", "brand-new-past", 4)
            .await
            .unwrap_err();
        assert_eq!((err.field(), err.message_code()), ("confirm_password", "EC002"));

        let err = users
            .change_password(&user, "initial-pass", "12345678", "12345678", 4)
            .await
            .unwrap_err();
        assert_eq!((err.field(), err.message_code()), ("new_password", "VP001"));

        users
            .change_password(&user, "initial-pass", "brand-new-pass", "brand-new-pass", 4)
            .await
            .unwrap();
        assert!(users.authenticate("hank", "brand-new-pass").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn admin_bootstrap_runs_once() {
        let users = UserService::new(test_pool().await);
        let admin = AdminBootstrap {
            username: "root".to_string(),
            email: "Root@Example.com".to_string(),
            password: "bootstrap-pass".to_string(),
        };

        assert!(users.ensure_admin(&admin, 4).await.unwrap());
        assert!(!users.ensure_admin(&admin, 4).await.unwrap());

        let root = users.authenticate("root", "bootstrap-pass").await.unwrap().unwrap();
        assert!(root.is_admin());
        assert_eq!(root.email, "root@example.com");
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let users = UserService::new(test_pool().await);
        let user = seed_user(&users, "erin", "erin@example.com", Role::Admin).await;

        assert!(users.delete(user.id).await.unwrap());
        assert!(!users.delete(user.id).await.unwrap());
    }
}
