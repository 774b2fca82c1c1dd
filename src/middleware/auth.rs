use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::models::user::{Role, TokenType, User};
use crate::services::token_service::TokenService;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        CurrentUser {
            role: user.role(),
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Who is making the request. Inserted into extensions for every request.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Authenticated(CurrentUser),
}

/// No header means anonymous. A header that does not check out is rejected
/// outright rather than downgraded.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = match bearer_token(request.headers()) {
        None => Principal::Anonymous,
        Some(token) => {
            let claims = state
                .tokens
                .decode(&token, TokenType::Access)
                .map_err(|e| {
                    tracing::debug!("Rejected bearer token: {}", e);
                    AppError::AuthError
                })?;
            let user_id = TokenService::user_id(&claims)?;

            let user = state
                .users
                .find_by_id(user_id)
                .await?
                .filter(|user| user.is_active)
                .ok_or(AppError::AuthError)?;

            Principal::Authenticated(user.into())
        }
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Principal>() {
            Some(Principal::Authenticated(user)) => Ok(AuthUser(user.clone())),
            _ => Err(AppError::AuthError),
        }
    }
}

/// Signed-in user with the admin role. Anonymous callers get 401, others 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            tracing::warn!("User {} <{}> attempted an admin action", user.username, user.email);
            return Err(AppError::Unauthorized);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn current_user_keeps_identity_and_role() {
        let user = User {
            id: 3,
            username: "mira".to_string(),
            email: "mira@example.com".to_string(),
            phone: None,
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            role: "admin".to_string(),
            is_active: true,
            date_joined: chrono::Utc::now(),
        };

        let current = CurrentUser::from(user);
        assert_eq!(current.id, 3);
        assert_eq!(current.username, "mira");
        assert_eq!(current.email, "mira@example.com");
        assert_eq!(current.role, Role::Admin);
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }
}
