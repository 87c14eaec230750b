//! API Routes

pub mod analytics;
pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod forms;
pub mod health;
pub mod responses;
pub mod users;

use feedback_forms::FormDocument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::{ApiError, ApiResult, ApiState};

/// Parse a path id; malformed ids are reported like missing ones.
pub(crate) fn parse_id(raw: &str, missing: fn() -> ApiError) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| missing())
}

/// Form by path id, 404 if absent.
pub(crate) async fn load_form(state: &ApiState, raw_id: &str) -> ApiResult<FormDocument> {
    let id = parse_id(raw_id, ApiError::form_not_found)?;
    state
        .forms
        .get(id)
        .await?
        .ok_or_else(ApiError::form_not_found)
}

/// Form by path id that the caller owns. Other users' forms are reported
/// as missing.
pub(crate) async fn load_owned_form(
    state: &ApiState,
    raw_id: &str,
    user: &AuthUser,
) -> ApiResult<FormDocument> {
    let form = load_form(state, raw_id).await?;
    if !form.is_owned_by(user.id()) {
        return Err(ApiError::form_not_found());
    }
    Ok(form)
}
