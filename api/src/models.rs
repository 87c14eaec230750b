//! API Models

use feedback_forms::{FormConfig, FormDocument, PublicProfile, QuestionDefinition, ResponseRecord, UserAccount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

/// Error body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ============ Accounts ============

/// Registration request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Password change
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordChange {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub user: UserAccount,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoggedInUser {
    pub user: UserAccount,
    pub message: String,
}

/// `user` is null when the caller is anonymous.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub user: Option<UserAccount>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUser {
    pub message: String,
    pub user: UserAccount,
}

// ============ Forms ============

/// Create / update body. Missing fields fail validation.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FormPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<QuestionDefinition>,
}

#[derive(Debug, Serialize)]
pub struct FormMessage {
    pub message: String,
    pub form: FormDocument,
}

/// Form lookup by share code
#[derive(Debug, Serialize)]
pub struct SharedForm {
    pub form: FormDocument,
    pub owner: PublicProfile,
}

// ============ Responses ============

/// Submission body
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

/// A form with all of its responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponses {
    pub id: Uuid,
    pub title: String,
    pub config: FormConfig,
    pub responses: Vec<ResponseRecord>,
}

/// One of the caller's submissions, with its form if it still exists
#[derive(Debug, Serialize)]
pub struct SubmissionWithForm {
    #[serde(flatten)]
    pub response: ResponseRecord,
    pub form: Option<FormDocument>,
}

#[derive(Debug, Serialize)]
pub struct ResponseDetail {
    pub response: ResponseRecord,
    pub form: FormDocument,
}

// ============ Contact ============

/// Contact form body. Missing fields are reported as one 400.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============ Dashboard ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_forms: usize,
    pub total_responses: usize,
    pub drafted_forms: usize,
    pub recent_forms: Vec<FormDocument>,
}
