//! Response analytics
//!
//! Reduces a form's responses into an [`AnalyticsReport`]: totals, a
//! completion rate, a seven-day submission trend and one summary per
//! question, shaped by the question's [`QuestionFamily`].
//!
//! The reduction is pure and never fails. Answers that cannot be read the
//! way their question type expects are left out of the derived numbers.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};
use utoipa::ToSchema;

use crate::domain::aggregates::{FormDocument, ResponseRecord};
use crate::domain::value_objects::{QuestionDefinition, QuestionFamily, QuestionType};

/// Days covered by [`AnalyticsReport::trends`], today included.
pub const TREND_DAYS: usize = 7;

/// Aggregated view of a form's responses.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_responses: usize,
    /// Whole percent of responses with at least one answer.
    pub completion_rate: u32,
    /// Oldest first, today last.
    pub trends: Vec<TrendBucket>,
    /// Keyed by question id, in the form's element order.
    pub per_question: IndexMap<String, QuestionAnalysis>,
}

/// Submissions received on one calendar day.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    /// `M/D/YYYY`
    pub date: String,
    #[serde(skip)]
    pub day: NaiveDate,
    pub response_count: usize,
}

/// Summary of the answers to one question.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct QuestionAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub question_type: QuestionType,
    /// Every non-null answer, in response order.
    pub responses: Vec<Value>,
    #[serde(flatten)]
    pub summary: QuestionSummary,
}

/// Type-specific part of a [`QuestionAnalysis`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum QuestionSummary {
    Choice {
        #[serde(rename = "optionCounts")]
        option_counts: OptionCounts,
    },
    Text {
        #[serde(rename = "responseCount")]
        response_count: usize,
        #[serde(rename = "averageLength")]
        average_length: u64,
    },
    Numeric {
        count: usize,
        average: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean {
        #[serde(rename = "optionCounts")]
        option_counts: BooleanCounts,
    },
    Temporal {
        count: usize,
    },
    Unclassified {},
}

/// Per-option tallies in declaration order.
///
/// Answers that match no declared option are appended as new entries
/// rather than dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OptionCounts(IndexMap<String, usize>);

impl OptionCounts {
    /// Zeroed counts for the declared options.
    pub fn with_options(options: &[String]) -> Self {
        let mut counts = IndexMap::with_capacity(options.len());
        for option in options {
            counts.entry(option.clone()).or_insert(0);
        }
        Self(counts)
    }

    pub fn increment(&mut self, key: &str) {
        match self.0.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(key.to_string(), 1);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Yes/no tallies for boolean questions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BooleanCounts {
    #[serde(rename = "true")]
    pub true_count: usize,
    #[serde(rename = "false")]
    pub false_count: usize,
}

/// Aggregate against the local clock.
pub fn aggregate(form: &FormDocument, responses: &[ResponseRecord]) -> AnalyticsReport {
    aggregate_at(form, responses, Local::now())
}

/// Aggregate with the trend window ending on `now`'s calendar day, in
/// `now`'s time zone.
pub fn aggregate_at<Tz: TimeZone>(
    form: &FormDocument,
    responses: &[ResponseRecord],
    now: DateTime<Tz>,
) -> AnalyticsReport {
    let total_responses = responses.len();
    let completed = responses.iter().filter(|r| r.is_completed()).count();
    let completion_rate = if total_responses == 0 {
        0
    } else {
        (completed as f64 * 100.0 / total_responses as f64).round() as u32
    };

    let per_question = form
        .elements()
        .iter()
        .filter_map(|definition| {
            let Some((id, kind)) = definition.identified() else {
                tracing::trace!(form_id = %form.id, "skipping element without id or type");
                return None;
            };
            Some((id.to_string(), analyse_question(definition, kind, id, responses)))
        })
        .collect();

    AnalyticsReport {
        total_responses,
        completion_rate,
        trends: trends(responses, &now),
        per_question,
    }
}

fn trends<Tz: TimeZone>(responses: &[ResponseRecord], now: &DateTime<Tz>) -> Vec<TrendBucket> {
    let tz = now.timezone();
    let today = now.date_naive();
    let first = today - Duration::days(TREND_DAYS as i64 - 1);

    let mut counts = [0usize; TREND_DAYS];
    for response in responses {
        let day = response.submitted_at.with_timezone(&tz).date_naive();
        if day >= first && day <= today {
            counts[(day - first).num_days() as usize] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(offset, &response_count)| {
            let day = first + Duration::days(offset as i64);
            TrendBucket {
                date: day.format("%-m/%-d/%Y").to_string(),
                day,
                response_count,
            }
        })
        .collect()
}

fn analyse_question(
    definition: &QuestionDefinition,
    kind: &QuestionType,
    id: &str,
    responses: &[ResponseRecord],
) -> QuestionAnalysis {
    let answers: Vec<Value> = responses
        .iter()
        .filter_map(|r| r.answer(id))
        .cloned()
        .collect();

    let summary = match kind.family() {
        QuestionFamily::Choice => choice_summary(&definition.options, &answers),
        QuestionFamily::Text => text_summary(&answers),
        QuestionFamily::Numeric => numeric_summary(&answers),
        QuestionFamily::Boolean => boolean_summary(&answers),
        QuestionFamily::Temporal => QuestionSummary::Temporal { count: answers.len() },
        QuestionFamily::Unclassified => QuestionSummary::Unclassified {},
    };

    QuestionAnalysis {
        question: definition.question.clone(),
        question_type: kind.clone(),
        responses: answers,
        summary,
    }
}

fn choice_summary(options: &[String], answers: &[Value]) -> QuestionSummary {
    let mut option_counts = OptionCounts::with_options(options);
    for answer in answers {
        match answer {
            Value::Array(picked) => {
                for item in picked {
                    option_counts.increment(&display_value(item));
                }
            }
            other => option_counts.increment(&display_value(other)),
        }
    }
    QuestionSummary::Choice { option_counts }
}

fn text_summary(answers: &[Value]) -> QuestionSummary {
    let lengths: Vec<usize> = answers
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.encode_utf16().count())
        .collect();
    let average_length = if lengths.is_empty() {
        0
    } else {
        (lengths.iter().sum::<usize>() as f64 / lengths.len() as f64).round() as u64
    };
    QuestionSummary::Text {
        response_count: answers.len(),
        average_length,
    }
}

fn numeric_summary(answers: &[Value]) -> QuestionSummary {
    let values: Vec<f64> = answers.iter().filter_map(coerce_number).collect();
    if values.is_empty() {
        return QuestionSummary::Numeric { count: 0, average: 0.0, min: None, max: None };
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    QuestionSummary::Numeric {
        count: values.len(),
        average: round_to_hundredths(sum / values.len() as f64),
        min: Some(min),
        max: Some(max),
    }
}

fn boolean_summary(answers: &[Value]) -> QuestionSummary {
    let mut option_counts = BooleanCounts::default();
    for answer in answers {
        match answer {
            Value::Bool(true) => option_counts.true_count += 1,
            Value::Bool(false) => option_counts.false_count += 1,
            Value::String(s) if s == "true" => option_counts.true_count += 1,
            Value::String(s) if s == "false" => option_counts.false_count += 1,
            _ => {}
        }
    }
    QuestionSummary::Boolean { option_counts }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Text form of an answer, used as its option key: strings as-is, whole
/// numbers without a fraction, lists comma-joined.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => display_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Numeric reading of an answer, `None` when it has none.
///
/// Blank strings and empty lists read as zero, booleans as 0/1, and
/// strings may carry decimal, exponent, `0x`/`0o`/`0b` or `Infinity`
/// notation.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_numeric_text(s),
        Value::Array(_) => parse_numeric_text(&display_value(value)),
        Value::Null | Value::Object(_) => None,
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }
    // f64::from_str also takes "inf"/"nan"; only plain decimal notation counts
    let decimal = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !decimal {
        return None;
    }
    text.parse::<f64>().ok()
}
