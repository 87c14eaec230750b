//! Contact form endpoint

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use feedback_forms::ContactMessage;

use crate::models::*;
use crate::{ApiResult, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/", post(submit_contact))
}

/// Leave a message for the site operators
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Missing fields", body = ErrorBody)
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(input) = payload?;
    let message = ContactMessage::new(
        input.name.as_deref().unwrap_or_default(),
        input.email.as_deref().unwrap_or_default(),
        input.message.as_deref().unwrap_or_default(),
    )?;
    state.contacts.insert(&message).await?;
    tracing::info!(contact_id = %message.id, "contact message received");
    Ok(Json(MessageResponse::new("Success")))
}
