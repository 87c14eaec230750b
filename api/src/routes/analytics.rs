//! Analytics endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use feedback_forms::{aggregate, AnalyticsReport};

use crate::middleware::auth::AuthUser;
use crate::models::ErrorBody;
use crate::routes::load_owned_form;
use crate::{ApiResult, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/:id/analytics", get(get_form_analytics))
}

/// Response analytics for a form
///
/// Totals, completion rate, a seven-day trend and per-question summaries.
/// Only the form's owner may read them.
#[utoipa::path(
    get,
    path = "/api/forms/{id}/analytics",
    params(("id" = String, Path, description = "Form id")),
    responses(
        (status = 200, description = "Analytics report", body = AnalyticsReport),
        (status = 401, description = "Not signed in", body = ErrorBody),
        (status = 404, description = "Form not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    tag = "analytics"
)]
pub async fn get_form_analytics(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AnalyticsReport>> {
    let form = load_owned_form(&state, &id, &user).await?;
    let responses = state.responses.list_by_form(form.id).await?;
    let report = aggregate(&form, &responses);
    tracing::debug!(
        form_id = %form.id,
        total = report.total_responses,
        questions = report.per_question.len(),
        "analytics computed"
    );
    Ok(Json(report))
}
