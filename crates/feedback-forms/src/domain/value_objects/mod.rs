//! Forms value objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Question type.
///
/// Stored on the wire as its kebab-case name. Names outside the known set
/// (`datetime`, `file-upload`, anything a newer builder emits) are kept
/// verbatim in [`QuestionType::Other`] so a form round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    ShortText,
    LongText,
    MultipleChoice,
    SingleChoice,
    Checkbox,
    Dropdown,
    StarRating,
    Scale,
    Number,
    Rating,
    Boolean,
    Date,
    Time,
    Other(String),
}

/// How answers to a question type are summarised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionFamily {
    /// Answers are option labels (or sets of them) and get counted.
    Choice,
    Text,
    Numeric,
    Boolean,
    Temporal,
    Unclassified,
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ShortText => "short-text",
            Self::LongText => "long-text",
            Self::MultipleChoice => "multiple-choice",
            Self::SingleChoice => "single-choice",
            Self::Checkbox => "checkbox",
            Self::Dropdown => "dropdown",
            Self::StarRating => "star-rating",
            Self::Scale => "scale",
            Self::Number => "number",
            Self::Rating => "rating",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Time => "time",
            Self::Other(name) => name,
        }
    }

    /// Aggregation family. Star ratings are counted per value like a
    /// single-choice question, not averaged.
    pub fn family(&self) -> QuestionFamily {
        match self {
            Self::MultipleChoice
            | Self::SingleChoice
            | Self::Checkbox
            | Self::Dropdown
            | Self::StarRating => QuestionFamily::Choice,
            Self::ShortText | Self::LongText => QuestionFamily::Text,
            Self::Number | Self::Rating | Self::Scale => QuestionFamily::Numeric,
            Self::Boolean => QuestionFamily::Boolean,
            Self::Date | Self::Time => QuestionFamily::Temporal,
            Self::Other(_) => QuestionFamily::Unclassified,
        }
    }
}

impl From<String> for QuestionType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "short-text" => Self::ShortText,
            "long-text" => Self::LongText,
            "multiple-choice" => Self::MultipleChoice,
            "single-choice" => Self::SingleChoice,
            "checkbox" => Self::Checkbox,
            "dropdown" => Self::Dropdown,
            "star-rating" => Self::StarRating,
            "scale" => Self::Scale,
            "number" => Self::Number,
            "rating" => Self::Rating,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(kind: QuestionType) -> Self {
        match kind {
            QuestionType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a form.
///
/// The builder owns the element shape, so `id` and `type` are optional here
/// and builder-specific settings (`maxStars`, `dateFormat`, ...) are carried
/// in `extra` untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QuestionDefinition {
    pub fn new(id: impl Into<String>, question_type: impl Into<QuestionType>) -> Self {
        Self {
            id: Some(id.into()),
            question_type: Some(question_type.into()),
            ..Default::default()
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// `(id, type)` when both are present and non-empty; elements missing
    /// either are skipped by analytics.
    pub fn identified(&self) -> Option<(&str, &QuestionType)> {
        match (&self.id, &self.question_type) {
            (Some(id), Some(kind)) if !id.is_empty() && !kind.as_str().is_empty() => {
                Some((id.as_str(), kind))
            }
            _ => None,
        }
    }
}

/// Form lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl FormStatus {
    /// Only published forms take submissions.
    pub fn accepts_responses(self) -> bool {
        self == FormStatus::Published
    }
}
