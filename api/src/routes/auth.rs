//! Account and session endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use feedback_forms::{RepositoryError, UserAccount};

use crate::middleware::auth::{
    clear_session_cookie, hash_password, session_cookie, verify_password, AuthUser,
    MaybeAuthUser,
};
use crate::models::*;
use crate::{ApiError, ApiResult, ApiState};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 100;
const MAX_BIO_LEN: usize = 300;
const MAX_LOCATION_LEN: usize = 100;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
        .route("/change-password", post(change_password))
}

/// Create an account and start a session
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie set"),
        (status = 400, description = "Invalid input or email taken", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    let email = normalize_email(&input.email);
    if !looks_like_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    check_password(&input.password)?;
    let name = input.name.trim();
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Name must be at least {MIN_NAME_LEN} characters"
        )));
    }

    let user = UserAccount::new(email, name, hash_password(&input.password)?);
    match state.users.insert(&user).await {
        Ok(()) => {}
        Err(RepositoryError::Conflict(_)) => {
            return Err(ApiError::BadRequest("User already exists".into()));
        }
        Err(other) => return Err(other.into()),
    }
    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_token(&state, &user)?;
    let cookie = session_cookie(&token, state.tokens.ttl_secs(), state.config.secure_cookies);
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(RegisteredUser { user, token }),
    )
        .into_response())
}

/// Start a session
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, session cookie set"),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(input) = payload?;
    let user = state
        .users
        .find_by_email(&normalize_email(&input.email))
        .await?
        .filter(|user| verify_password(&input.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::debug!("login rejected");
            ApiError::InvalidCredentials
        })?;

    let token = issue_token(&state, &user)?;
    let cookie = session_cookie(&token, state.tokens.ttl_secs(), state.config.secure_cookies);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoggedInUser { user, message: "Login successful".into() }),
    )
        .into_response())
}

/// End the session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<ApiState>>) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Json(MessageResponse::new("Logged out successfully")),
    )
        .into_response()
}

/// The signed-in account, or `{"user": null}` with 401
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account"),
        (status = 401, description = "Not signed in")
    ),
    tag = "auth"
)]
pub async fn me(MaybeAuthUser(user): MaybeAuthUser) -> Response {
    let status = if user.is_some() { StatusCode::OK } else { StatusCode::UNAUTHORIZED };
    (status, Json(CurrentUser { user })).into_response()
}

/// Update name, bio and location
#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn update_me(
    State(state): State<Arc<ApiState>>,
    AuthUser(mut user): AuthUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdatedUser>> {
    let Json(input) = payload?;
    let name = input.name.trim().to_string();
    let name_len = name.chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Name must be between 1 and {MAX_NAME_LEN} characters"
        )));
    }
    check_max_len("Bio", input.bio.as_deref(), MAX_BIO_LEN)?;
    check_max_len("Location", input.location.as_deref(), MAX_LOCATION_LEN)?;

    user.update_profile(name, input.bio, input.location);
    state.users.save(&user).await?;
    Ok(Json(UpdatedUser { message: "Profile updated successfully".into(), user }))
}

/// Replace the account password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = PasswordChange,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Password too short", body = ErrorBody),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<ApiState>>,
    AuthUser(mut user): AuthUser,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(input) = payload?;
    check_password(&input.password)?;
    user.set_password_hash(hash_password(&input.password)?);
    state.users.save(&user).await?;
    tracing::info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

fn issue_token(state: &ApiState, user: &UserAccount) -> ApiResult<String> {
    state
        .tokens
        .issue(user)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn check_password(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn check_max_len(field: &str, value: Option<&str>, max: usize) -> ApiResult<()> {
    match value {
        Some(value) if value.chars().count() > max => Err(ApiError::BadRequest(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("ann@example.com"));
        assert!(!looks_like_email("ann.example.com"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ann@example"));
        assert!(!looks_like_email("ann@@example.com"));
        assert!(!looks_like_email("ann smith@example.com"));
    }

    #[test]
    fn test_field_limits() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
        assert!(check_max_len("Bio", Some(&"x".repeat(301)), MAX_BIO_LEN).is_err());
        assert!(check_max_len("Bio", Some(&"x".repeat(300)), MAX_BIO_LEN).is_ok());
        assert!(check_max_len("Bio", None, MAX_BIO_LEN).is_ok());
    }
}
