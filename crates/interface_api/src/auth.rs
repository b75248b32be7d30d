//! Sessions and role guards
//!
//! A session is a signed JWT carried in the `feebook_session` cookie (browsers)
//! or an `Authorization: Bearer` header (scripts and tests). The token names
//! the account, its role and display name; nothing else is trusted from the
//! client.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use core_kernel::{ConsumerId, ModeratorId, ProviderId, Role};

use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "feebook_session";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id within the role's table
    pub sub: Uuid,
    pub role: Role,
    /// Display name
    pub name: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::unauthorized(),
            AuthError::TokenExpired => {
                ApiError::Unauthorized("Session expired, sign in again".to_string())
            }
            AuthError::Signing(msg) => ApiError::Internal(msg),
        }
    }
}

/// Signs a session token
///
/// # Arguments
///
/// * `account_id` - Id of the provider, consumer or moderator
/// * `role` - Which table `account_id` belongs to
/// * `name` - Display name shown by clients
/// * `secret` - JWT secret key
/// * `ttl_secs` - Token validity in seconds
pub fn create_token(
    account_id: Uuid,
    role: Role,
    name: &str,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_secs as i64);

    let claims = Claims {
        sub: account_id,
        role,
        name: name.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Validates a session token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// `Set-Cookie` value that stores a session
pub fn session_cookie(token: &str, ttl_secs: u64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        ttl_secs,
        if secure { "; Secure" } else { "" }
    )
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Finds the session token, preferring the Authorization header
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// The signed-in account
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub account_id: Uuid,
    pub role: Role,
    pub name: String,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            account_id: claims.sub,
            role: claims.role,
            name: claims.name,
        }
    }
}

impl Session {
    fn require(self, role: Role) -> Result<Self, ApiError> {
        if self.role == role {
            Ok(self)
        } else {
            Err(ApiError::Forbidden(format!(
                "This action is for {} accounts",
                role.as_str()
            )))
        }
    }
}

/// Requires a session placed by `auth_middleware`
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// A session if the request carries a valid one; for public routes
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(MaybeSession(Some(session.clone())));
        }
        let session = token_from_headers(&parts.headers)
            .and_then(|token| validate_token(&token, &state.config.jwt_secret).ok())
            .map(Session::from);
        Ok(MaybeSession(session))
    }
}

/// Signed-in provider
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub id: ProviderId,
    pub name: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ProviderSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await?
            .require(Role::Provider)?;
        Ok(Self {
            id: ProviderId::from_uuid(session.account_id),
            name: session.name,
        })
    }
}

/// Signed-in consumer
#[derive(Debug, Clone)]
pub struct ConsumerSession {
    pub id: ConsumerId,
    pub name: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ConsumerSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await?
            .require(Role::Consumer)?;
        Ok(Self {
            id: ConsumerId::from_uuid(session.account_id),
            name: session.name,
        })
    }
}

/// Signed-in moderator whose account is still active
///
/// Deactivation takes effect on the next request, not at token expiry.
#[derive(Debug, Clone)]
pub struct ModeratorSession {
    pub id: ModeratorId,
    pub name: String,
}

#[async_trait]
impl FromRequestParts<AppState> for ModeratorSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await?
            .require(Role::Moderator)?;
        let id = ModeratorId::from_uuid(session.account_id);

        let moderator = state.moderators.get_moderator(id).await.map_err(|e| {
            if e.is_not_found() {
                ApiError::unauthorized()
            } else {
                ApiError::from(e)
            }
        })?;
        if !moderator.is_active {
            warn!(moderator_id = %id, "Inactive moderator presented a session");
            return Err(ApiError::Forbidden("Account is inactive".to_string()));
        }

        Ok(Self {
            id,
            name: session.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let id = Uuid::now_v7();
        let token = create_token(id, Role::Consumer, "Meera", SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Consumer);
        assert_eq!(claims.name, "Meera");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(Uuid::now_v7(), Role::Provider, "School", SECRET, 60).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::now_v7(),
            role: Role::Moderator,
            name: "Admin".to_string(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            validate_token(&token, SECRET),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, true);
        assert_eq!(
            cookie,
            "feebook_session=abc; HttpOnly; SameSite=Lax; Path=/; Max-Age=3600; Secure"
        );
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
        assert!(!clear_session_cookie(false).contains("Secure"));
    }

    #[test]
    fn test_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; feebook_session=tok123; lang=en"),
        );
        assert_eq!(token_from_headers(&headers), Some("tok123".to_string()));
    }

    #[test]
    fn test_bearer_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("feebook_session=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(token_from_headers(&headers), Some("header".to_string()));
    }

    #[test]
    fn test_cleared_cookie_is_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("feebook_session="));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_role_guard() {
        let session = Session {
            account_id: Uuid::now_v7(),
            role: Role::Consumer,
            name: "Meera".to_string(),
        };
        assert!(session.clone().require(Role::Consumer).is_ok());
        assert!(matches!(
            session.require(Role::Provider),
            Err(ApiError::Forbidden(_))
        ));
    }

    proptest! {
        #[test]
        fn test_cookie_value_survives_parsing(token in "[A-Za-z0-9_.-]{1,200}") {
            let mut headers = HeaderMap::new();
            let cookie = format!("a=1; {}={}", SESSION_COOKIE, token);
            headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
            prop_assert_eq!(token_from_headers(&headers), Some(token));
        }
    }
}
