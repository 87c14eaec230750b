//! Authentication
//!
//! Sessions are HS256 JWTs carried either as `Authorization: Bearer` or in
//! the `token` cookie. [`AuthUser`] resolves the token to a stored account
//! and rejects the request with 401 otherwise.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use feedback_forms::UserAccount;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, ApiState};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs and verifies session tokens.
///
/// An issuer built from an empty secret neither issues nor accepts tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    keyed: bool,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
            keyed: !secret.is_empty(),
        }
    }

    fn ensure_keyed(&self) -> Result<(), jsonwebtoken::errors::Error> {
        if self.keyed {
            Ok(())
        } else {
            Err(ErrorKind::InvalidKeyFormat.into())
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &UserAccount) -> Result<String, jsonwebtoken::errors::Error> {
        self.ensure_keyed()?;
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now as usize,
            exp: (now + self.ttl_secs) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.ensure_keyed()?;
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }
}

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Session token from the bearer header, else the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a fresh session.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> HeaderValue {
    cookie_header(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    ), secure)
}

/// `Set-Cookie` value that expires the session.
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    cookie_header(&format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"), secure)
}

fn cookie_header(base: &str, secure: bool) -> HeaderValue {
    let value = if secure { format!("{base}; Secure") } else { base.to_string() };
    // tokens are base64url, so the cookie is always a valid header value
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("token=; Max-Age=0"))
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserAccount);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = state.tokens.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            ApiError::Unauthorized
        })?;
        match state.users.get(claims.sub).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                tracing::debug!(user_id = %claims.sub, "session for unknown user");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// The caller if a valid session is present.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<UserAccount>);

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(AuthUser(user)) => Ok(MaybeAuthUser(Some(user))),
            Err(ApiError::Unauthorized) => Ok(MaybeAuthUser(None)),
            Err(other) => Err(other),
        }
    }
}
