//! Feedback Forms
//!
//! Domain library for the feedback form service.
//!
//! ## Features
//! - Form documents with a draft / published / archived lifecycle
//! - Share codes for published forms
//! - Response records, one per respondent and form
//! - Per-question response analytics with a seven-day trend
//! - Contact messages from the public site
//! - Store traits with in-memory implementations

use thiserror::Error;

pub mod analytics;
pub mod domain;
pub mod share_code;
pub mod store;

pub use analytics::{
    aggregate, aggregate_at, AnalyticsReport, BooleanCounts, OptionCounts, QuestionAnalysis,
    QuestionSummary, TrendBucket,
};
pub use domain::aggregates::{
    ContactMessage, FormConfig, FormDocument, PublicProfile, ResponseRecord, UserAccount,
    UserRole,
};
pub use domain::value_objects::{FormStatus, QuestionDefinition, QuestionFamily, QuestionType};
pub use store::{
    ContactStore, FormStore, InMemoryContactStore, InMemoryFormStore, InMemoryResponseStore,
    InMemoryUserStore, RepoResult, RepositoryError, ResponseStore, UserStore,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("Form not found")]
    FormNotFound,

    #[error("Response not found")]
    ResponseNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("This form is not accepting responses.")]
    NotAcceptingResponses,

    #[error("Form owners cannot submit responses")]
    OwnerSubmission,

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, FormsError>;
