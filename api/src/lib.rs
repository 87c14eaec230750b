//! Feedback Forms API
//!
//! REST API for building forms, publishing them behind share codes,
//! collecting responses and reading per-form analytics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          REST API                               │
//! │  auth · forms · responses · analytics · dashboard · contact     │
//! └───────────────┬─────────────────────────────────────────────────┘
//!                 │ AuthUser (JWT bearer / cookie)
//! ┌───────────────▼─────────────────────────────────────────────────┐
//! │                       feedback-forms                            │
//! │   FormDocument · ResponseRecord · aggregate() · share codes     │
//! │   FormStore · ResponseStore · UserStore                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use feedback_forms::{
    AnalyticsReport, BooleanCounts, ContactStore, FormStore, InMemoryContactStore,
    InMemoryFormStore, InMemoryResponseStore, InMemoryUserStore, OptionCounts,
    QuestionAnalysis, QuestionSummary, ResponseStore, TrendBucket, UserStore,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
use middleware::auth::TokenIssuer;
pub use models::*;

/// Shared request state
pub struct ApiState {
    pub forms: Arc<dyn FormStore>,
    pub responses: Arc<dyn ResponseStore>,
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub tokens: TokenIssuer,
    pub config: ServerConfig,
}

impl ApiState {
    pub fn new(
        config: ServerConfig,
        forms: Arc<dyn FormStore>,
        responses: Arc<dyn ResponseStore>,
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
    ) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl_secs());
        Self { forms, responses, users, contacts, tokens, config }
    }

    /// State over fresh in-memory stores.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryFormStore::new()),
            Arc::new(InMemoryResponseStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryContactStore::new()),
        )
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Feedback Forms API",
        version = "0.1.0",
        description = "Form builder, response collection and analytics",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::me,
        routes::auth::update_me,
        routes::auth::change_password,
        routes::users::get_profile,
        routes::forms::list_forms,
        routes::forms::create_form,
        routes::forms::get_form,
        routes::forms::update_form,
        routes::forms::delete_form,
        routes::forms::publish_form,
        routes::forms::unpublish_form,
        routes::forms::archive_form,
        routes::forms::get_shared_form,
        routes::responses::list_form_responses,
        routes::responses::submit_response,
        routes::responses::delete_response,
        routes::responses::list_my_responses,
        routes::responses::get_response,
        routes::analytics::get_form_analytics,
        routes::dashboard::get_dashboard,
        routes::contact::submit_contact,
    ),
    components(
        schemas(
            ErrorBody, MessageResponse,
            RegisterRequest, LoginRequest, ProfileUpdate, PasswordChange, ContactRequest,
            AnalyticsReport, TrendBucket, QuestionAnalysis, QuestionSummary,
            OptionCounts, BooleanCounts,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Accounts and sessions"),
        (name = "forms", description = "Form management"),
        (name = "responses", description = "Response collection"),
        (name = "analytics", description = "Response analytics"),
        (name = "dashboard", description = "Per-user overview"),
        (name = "contact", description = "Public contact form")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/user", routes::users::router())
        .nest(
            "/forms",
            routes::forms::router()
                .merge(routes::responses::form_router())
                .merge(routes::analytics::router()),
        )
        .nest("/responses", routes::responses::router())
        .nest("/dashboard", routes::dashboard::router())
        .nest("/contact", routes::contact::router())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(ApiState::in_memory(ServerConfig::default()))
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let response = app()
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        for uri in ["/api/forms", "/api/dashboard", "/api/responses"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[test]
    fn test_openapi_lists_analytics() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/forms/{id}/analytics"));
        let schemas = doc.components.expect("components").schemas;
        assert!(schemas.contains_key("AnalyticsReport"));
        assert!(schemas.contains_key("QuestionAnalysis"));
    }
}
