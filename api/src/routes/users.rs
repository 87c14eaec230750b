//! Public profile endpoint

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use feedback_forms::{FormsError, PublicProfile};

use crate::middleware::auth::AuthUser;
use crate::models::ErrorBody;
use crate::routes::parse_id;
use crate::{ApiError, ApiResult, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/:user_id", get(get_profile))
}

fn user_not_found() -> ApiError {
    FormsError::UserNotFound.into()
}

/// Another user's public profile
#[utoipa::path(
    get,
    path = "/api/user/{user_id}",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Name, email, bio and location"),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn get_profile(
    State(state): State<Arc<ApiState>>,
    _user: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let id = parse_id(&user_id, user_not_found)?;
    let user = state.users.get(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(user.profile()))
}
