//! Response collection endpoints
//!
//! Two routers: [`form_router`] is nested under `/api/forms` for the
//! per-form operations, [`router`] under `/api/responses` for the caller's
//! own submissions.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use feedback_forms::{FormsError, RepositoryError, ResponseRecord};

use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::routes::{load_form, load_owned_form, parse_id};
use crate::{ApiError, ApiResult, ApiState};

pub fn form_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/:id/responses", get(list_form_responses).post(submit_response))
        .route("/:id/responses/:response_id", delete(delete_response))
}

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_my_responses))
        .route("/:id", get(get_response))
}

fn response_not_found() -> ApiError {
    FormsError::ResponseNotFound.into()
}

/// All responses of a form, newest first
#[utoipa::path(
    get,
    path = "/api/forms/{id}/responses",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Form with its responses"),
        (status = 404, description = "Form not found", body = ErrorBody)
    ),
    tag = "responses"
)]
pub async fn list_form_responses(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<FormResponses>> {
    let form = load_owned_form(&state, &id, &user).await?;
    let responses = state.responses.list_by_form(form.id).await?;
    Ok(Json(FormResponses {
        id: form.id,
        title: form.title,
        config: form.config,
        responses,
    }))
}

/// Submit a response to a published form
#[utoipa::path(
    post,
    path = "/api/forms/{id}/responses",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 201, description = "Response recorded"),
        (status = 400, description = "Missing response data", body = ErrorBody),
        (status = 403, description = "Form closed, or caller owns it", body = ErrorBody),
        (status = 404, description = "Form not found", body = ErrorBody),
        (status = 409, description = "Caller already responded", body = ErrorBody)
    ),
    tag = "responses"
)]
pub async fn submit_response(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<SubmissionPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResponseRecord>)> {
    let form = load_form(&state, &id).await?;
    let Json(payload) = payload?;
    let record = form.accept_submission(user.id(), payload.data.unwrap_or_default())?;

    match state.responses.insert(&record).await {
        Ok(()) => {}
        Err(RepositoryError::Conflict(_)) => {
            return Err(ApiError::Conflict(
                "You have already submitted a response to this form".into(),
            ));
        }
        Err(other) => return Err(other.into()),
    }

    tracing::info!(form_id = %form.id, response_id = %record.id, "response submitted");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Delete one response of a form
#[utoipa::path(
    delete,
    path = "/api/forms/{id}/responses/{response_id}",
    params(
        ("id" = String, Path, description = "Form id"),
        ("response_id" = String, Path, description = "Response id")
    ),
    responses(
        (status = 200, description = "Response deleted", body = MessageResponse),
        (status = 403, description = "Caller does not own the form", body = ErrorBody),
        (status = 404, description = "Form or response not found", body = ErrorBody)
    ),
    tag = "responses"
)]
pub async fn delete_response(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path((id, response_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let form = load_form(&state, &id).await?;
    if !form.is_owned_by(user.id()) {
        return Err(ApiError::Forbidden(
            "Not authorized to delete responses of this form".into(),
        ));
    }

    let response_id = parse_id(&response_id, response_not_found)?;
    let belongs = state
        .responses
        .get(response_id)
        .await?
        .is_some_and(|r| r.form_id == form.id);
    if !belongs || !state.responses.delete(response_id).await? {
        return Err(response_not_found());
    }

    Ok(Json(MessageResponse::new("Response deleted successfully")))
}

/// The caller's submissions, newest first
#[utoipa::path(
    get,
    path = "/api/responses",
    responses(
        (status = 200, description = "Submissions with their forms"),
        (status = 404, description = "No submissions yet", body = ErrorBody)
    ),
    tag = "responses"
)]
pub async fn list_my_responses(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<SubmissionWithForm>>> {
    let responses = state.responses.list_by_respondent(user.id()).await?;
    if responses.is_empty() {
        return Err(ApiError::NotFound("No responses found".into()));
    }

    let mut submissions = Vec::with_capacity(responses.len());
    for response in responses {
        let form = state.forms.get(response.form_id).await?;
        submissions.push(SubmissionWithForm { response, form });
    }
    Ok(Json(submissions))
}

/// One response with its form
///
/// Visible to the respondent and to the form's owner.
#[utoipa::path(
    get,
    path = "/api/responses/{id}",
    params(("id" = String, Path, description = "Response id")),
    responses(
        (status = 200, description = "Response and form"),
        (status = 404, description = "Response not found", body = ErrorBody)
    ),
    tag = "responses"
)]
pub async fn get_response(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponseDetail>> {
    let id = parse_id(&id, response_not_found)?;
    let response = state
        .responses
        .get(id)
        .await?
        .ok_or_else(response_not_found)?;
    let form = state
        .forms
        .get(response.form_id)
        .await?
        .ok_or_else(ApiError::form_not_found)?;

    let caller = user.id();
    if response.respondent_id != Some(caller) && !form.is_owned_by(caller) {
        return Err(response_not_found());
    }

    Ok(Json(ResponseDetail { response, form }))
}
