use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, TokenType, User};

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: String, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        }
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user: &User, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role(),
            token_type,
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }

    /// Verifies signature and expiry, then insists on the expected token type.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        if token_data.claims.token_type != expected {
            return Err(AppError::AuthError);
        }

        Ok(token_data.claims)
    }

    pub fn user_id(claims: &Claims) -> Result<i64> {
        claims.sub.parse().map_err(|_| AppError::AuthError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn user() -> User {
        User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: None,
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role: "admin".to_string(),
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let tokens = TokenService::new("secret".to_string(), 5, 1);
        let pair = tokens.issue_pair(&user()).unwrap();

        let claims = tokens.decode(&pair.access, TokenType::Access).unwrap();
        assert_eq!(TokenService::user_id(&claims).unwrap(), 7);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let tokens = TokenService::new("secret".to_string(), 5, 1);
        let pair = tokens.issue_pair(&user()).unwrap();

        assert!(tokens.decode(&pair.refresh, TokenType::Access).is_err());
        assert!(tokens.decode(&pair.access, TokenType::Refresh).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenService::new("secret".to_string(), 5, 1);
        let theirs = TokenService::new("other".to_string(), 5, 1);
        let token = theirs.issue(&user(), TokenType::Access).unwrap();

        assert!(matches!(
            ours.decode(&token, TokenType::Access),
            Err(AppError::Token(_))
        ));
    }
}
