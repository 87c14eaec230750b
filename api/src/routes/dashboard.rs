//! Dashboard endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use feedback_forms::FormStatus;

use crate::middleware::auth::AuthUser;
use crate::models::{DashboardSummary, ErrorBody};
use crate::{ApiResult, ApiState};

/// Forms shown under "recent".
const RECENT_FORMS: usize = 5;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", get(get_dashboard))
}

/// Overview of the caller's forms and submissions
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Form counts and recent forms"),
        (status = 401, description = "Not signed in", body = ErrorBody)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> ApiResult<Json<DashboardSummary>> {
    let forms = state.forms.list_by_owner(user.id()).await?;
    let submitted = state.responses.list_by_respondent(user.id()).await?;

    let count = |status: FormStatus| forms.iter().filter(|f| f.status == status).count();
    let active_forms = count(FormStatus::Published);
    let drafted_forms = count(FormStatus::Draft);

    Ok(Json(DashboardSummary {
        active_forms,
        total_responses: submitted.len(),
        drafted_forms,
        recent_forms: forms.into_iter().take(RECENT_FORMS).collect(),
    }))
}
