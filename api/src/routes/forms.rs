//! Form management endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use feedback_forms::{share_code, FormDocument, FormsError, RepositoryError};

use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::routes::{load_form, load_owned_form};
use crate::{ApiError, ApiResult, ApiState};

/// Attempts at drawing an unused share code before giving up.
const SHARE_CODE_ATTEMPTS: usize = 5;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/share/:share_code", get(get_shared_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
        .route("/:id/publish", patch(publish_form))
        .route("/:id/unpublish", patch(unpublish_form))
        .route("/:id/archive", patch(archive_form))
}

/// List the caller's forms, newest first
#[utoipa::path(
    get,
    path = "/api/forms",
    responses(
        (status = 200, description = "Forms owned by the caller"),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn list_forms(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<FormDocument>>> {
    Ok(Json(state.forms.list_by_owner(user.id()).await?))
}

/// Create a draft form
#[utoipa::path(
    post,
    path = "/api/forms",
    responses(
        (status = 201, description = "Form created"),
        (status = 400, description = "Missing title or elements", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn create_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FormDocument>)> {
    let Json(payload) = payload?;
    let form = FormDocument::create(user.id(), &payload.title, payload.elements)?;
    state.forms.save(&form).await?;
    tracing::info!(form_id = %form.id, owner_id = %form.owner_id, "form created");
    Ok((StatusCode::CREATED, Json(form)))
}

/// Get a form
#[utoipa::path(
    get,
    path = "/api/forms/{id}",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form document"),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn get_form(
    State(state): State<Arc<ApiState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FormDocument>> {
    Ok(Json(load_form(&state, &id).await?))
}

/// Replace a form's title and elements
#[utoipa::path(
    put,
    path = "/api/forms/{id}",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form updated"),
        (status = 400, description = "Missing title or elements", body = ErrorBody),
        (status = 403, description = "Caller does not own the form", body = ErrorBody),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn update_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<FormPayload>, JsonRejection>,
) -> ApiResult<Json<FormDocument>> {
    let mut form = load_form(&state, &id).await?;
    if !form.is_owned_by(user.id()) {
        return Err(ApiError::Forbidden("Not authorized to update this form".into()));
    }
    let Json(payload) = payload?;
    form.update(&payload.title, payload.elements)?;
    state.forms.save(&form).await?;
    Ok(Json(form))
}

/// Delete a form and its responses
#[utoipa::path(
    delete,
    path = "/api/forms/{id}",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form deleted", body = MessageResponse),
        (status = 403, description = "Caller does not own the form", body = ErrorBody),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn delete_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let form = load_form(&state, &id).await?;
    if !form.is_owned_by(user.id()) {
        return Err(ApiError::Forbidden("Not authorized to delete this form".into()));
    }
    let removed = state.responses.delete_by_form(form.id).await?;
    state.forms.delete(form.id).await?;
    tracing::info!(form_id = %form.id, responses = removed, "form deleted");
    Ok(Json(MessageResponse::new("Form deleted successfully")))
}

/// Publish a form, assigning a share code
#[utoipa::path(
    patch,
    path = "/api/forms/{id}/publish",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form published"),
        (status = 400, description = "Form has no elements", body = ErrorBody),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn publish_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FormMessage>> {
    let form = load_owned_form(&state, &id, &user).await?;
    let length = state.config.share_code_length;

    for _ in 0..SHARE_CODE_ATTEMPTS {
        let mut candidate = form.clone();
        candidate.publish(share_code::generate(length))?;
        match state.forms.save(&candidate).await {
            Ok(()) => {
                tracing::info!(
                    form_id = %candidate.id,
                    share_code = candidate.share_code.as_deref().unwrap_or_default(),
                    "form published"
                );
                return Ok(Json(FormMessage {
                    message: "Form published successfully".into(),
                    form: candidate,
                }));
            }
            Err(RepositoryError::Conflict(what)) => {
                tracing::debug!(form_id = %form.id, %what, "share code collision, retrying");
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(ApiError::Internal(format!(
        "no free share code for form {} after {SHARE_CODE_ATTEMPTS} attempts",
        form.id
    )))
}

/// Return a form to draft and revoke its share code
#[utoipa::path(
    patch,
    path = "/api/forms/{id}/unpublish",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form unpublished"),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn unpublish_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FormMessage>> {
    let mut form = load_owned_form(&state, &id, &user).await?;
    form.unpublish();
    state.forms.save(&form).await?;
    tracing::info!(form_id = %form.id, "form unpublished");
    Ok(Json(FormMessage { message: "Form unpublished".into(), form }))
}

/// Archive a form
#[utoipa::path(
    patch,
    path = "/api/forms/{id}/archive",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form archived"),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn archive_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FormMessage>> {
    let mut form = load_owned_form(&state, &id, &user).await?;
    form.archive();
    state.forms.save(&form).await?;
    tracing::info!(form_id = %form.id, "form archived");
    Ok(Json(FormMessage { message: "Form archived".into(), form }))
}

/// Look up a published form by share code
#[utoipa::path(
    get,
    path = "/api/forms/share/{share_code}",
    params(("share_code" = String, Path, description = "Share code")),
    responses(
        (status = 200, description = "Form and its owner's public profile"),
        (status = 400, description = "Caller already responded", body = ErrorBody),
        (status = 404, description = "No published form with this code", body = ErrorBody)
    ),
    tag = "forms"
)]
pub async fn get_shared_form(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<Json<SharedForm>> {
    let form = state
        .forms
        .find_by_share_code(&code)
        .await?
        .filter(|f| f.status.accepts_responses())
        .ok_or_else(ApiError::form_not_found)?;

    let owner = state
        .users
        .get(form.owner_id)
        .await?
        .ok_or(FormsError::UserNotFound)?;

    if state.responses.find_by_respondent(form.id, user.id()).await?.is_some() {
        return Err(ApiError::BadRequest(
            "You have already submitted a response to this form".into(),
        ));
    }

    Ok(Json(SharedForm { form, owner: owner.profile() }))
}
