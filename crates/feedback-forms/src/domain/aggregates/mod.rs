//! Form, response and account aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::value_objects::{FormStatus, QuestionDefinition};
use crate::{FormsError, Result};

/// Builder configuration of a form. Only `elements` is interpreted here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub elements: Vec<QuestionDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A form document as stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    pub id: Uuid,
    pub title: String,
    pub config: FormConfig,
    pub status: FormStatus,
    pub owner_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl FormDocument {
    /// New draft form owned by `owner_id`.
    pub fn create(
        owner_id: Uuid,
        title: &str,
        elements: Vec<QuestionDefinition>,
    ) -> Result<Self> {
        let title = validate_contents(title, &elements)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            config: FormConfig { elements, extra: Map::new() },
            status: FormStatus::Draft,
            owner_id,
            share_code: None,
            created_at: now,
            updated_at: now,
            published_at: None,
        })
    }

    pub fn elements(&self) -> &[QuestionDefinition] {
        &self.config.elements
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Replace title and elements.
    pub fn update(&mut self, title: &str, elements: Vec<QuestionDefinition>) -> Result<()> {
        self.title = validate_contents(title, &elements)?;
        self.config.elements = elements;
        self.touch();
        Ok(())
    }

    /// Publish, keeping an existing share code.
    pub fn publish(&mut self, share_code: String) -> Result<()> {
        if self.config.elements.is_empty() {
            return Err(FormsError::Validation("Form has no elements".into()));
        }
        self.status = FormStatus::Published;
        self.published_at = Some(Utc::now());
        if self.share_code.is_none() {
            self.share_code = Some(share_code);
        }
        self.touch();
        Ok(())
    }

    /// Back to draft; the share code is revoked.
    pub fn unpublish(&mut self) {
        self.status = FormStatus::Draft;
        self.published_at = None;
        self.share_code = None;
        self.touch();
    }

    pub fn archive(&mut self) {
        self.status = FormStatus::Archived;
        self.share_code = None;
        self.touch();
    }

    /// Check a submission against the form and build the record.
    pub fn accept_submission(
        &self,
        respondent_id: Uuid,
        data: Map<String, Value>,
    ) -> Result<ResponseRecord> {
        if !self.status.accepts_responses() {
            return Err(FormsError::NotAcceptingResponses);
        }
        if self.is_owned_by(respondent_id) {
            return Err(FormsError::OwnerSubmission);
        }
        if data.is_empty() {
            return Err(FormsError::Validation("Missing response data".into()));
        }
        Ok(ResponseRecord::new(self.id, Some(respondent_id), data))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_contents(title: &str, elements: &[QuestionDefinition]) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormsError::Validation("Form title is required".into()));
    }
    if elements.is_empty() {
        return Err(FormsError::Validation(
            "At least one form element is required".into(),
        ));
    }
    Ok(title.to_string())
}

/// One respondent's answers, keyed by question id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: Uuid,
    pub form_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<Uuid>,
    pub data: Map<String, Value>,
    pub submitted_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(form_id: Uuid, respondent_id: Option<Uuid>, data: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            respondent_id,
            data,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// At least one answer was given.
    pub fn is_completed(&self) -> bool {
        !self.data.is_empty()
    }

    /// The answer for `question_id`, treating explicit nulls as missing.
    pub fn answer(&self, question_id: &str) -> Option<&Value> {
        self.data.get(question_id).filter(|v| !v.is_null())
    }
}

/// Account role
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A registered account. The password hash never leaves the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash,
            name: name.into(),
            bio: String::new(),
            location: String::new(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_profile(&mut self, name: String, bio: Option<String>, location: Option<String>) {
        self.name = name;
        if let Some(bio) = bio {
            self.bio = bio;
        }
        if let Some(location) = location {
            self.location = location;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.updated_at = Utc::now();
    }

    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
        }
    }
}

/// What other users may see of an account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub location: String,
}

/// A message left through the public contact form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    /// All three fields are required; blank counts as missing.
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self> {
        let (name, email, message) = (name.trim(), email.trim(), message.trim());
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(FormsError::Validation("Missing fields".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn element(id: &str) -> QuestionDefinition {
        QuestionDefinition::new(id, "short-text")
    }

    fn answers(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_trims_title() {
        let form = FormDocument::create(Uuid::new_v4(), "  Feedback  ", vec![element("q1")]).unwrap();
        assert_eq!(form.title, "Feedback");
        assert_eq!(form.status, FormStatus::Draft);
        assert!(form.share_code.is_none());
    }

    #[test]
    fn test_create_requires_title_and_elements() {
        let owner = Uuid::new_v4();
        assert!(matches!(
            FormDocument::create(owner, "   ", vec![element("q1")]),
            Err(FormsError::Validation(_))
        ));
        assert!(matches!(
            FormDocument::create(owner, "Survey", vec![]),
            Err(FormsError::Validation(_))
        ));
    }

    #[test]
    fn test_publish_keeps_existing_share_code() {
        let mut form = FormDocument::create(Uuid::new_v4(), "Survey", vec![element("q1")]).unwrap();
        form.publish("AAAAAAAA".into()).unwrap();
        assert_eq!(form.status, FormStatus::Published);
        assert!(form.published_at.is_some());

        form.publish("BBBBBBBB".into()).unwrap();
        assert_eq!(form.share_code.as_deref(), Some("AAAAAAAA"));

        form.unpublish();
        assert_eq!(form.status, FormStatus::Draft);
        assert!(form.share_code.is_none());
        assert!(form.published_at.is_none());
    }

    #[test]
    fn test_submission_rules() {
        let owner = Uuid::new_v4();
        let respondent = Uuid::new_v4();
        let mut form = FormDocument::create(owner, "Survey", vec![element("q1")]).unwrap();

        let draft = form.accept_submission(respondent, answers(json!({ "q1": "hi" })));
        assert!(matches!(draft, Err(FormsError::NotAcceptingResponses)));

        form.publish("CODE1234".into()).unwrap();
        let own = form.accept_submission(owner, answers(json!({ "q1": "hi" })));
        assert!(matches!(own, Err(FormsError::OwnerSubmission)));

        let empty = form.accept_submission(respondent, Map::new());
        assert!(matches!(empty, Err(FormsError::Validation(_))));

        let record = form.accept_submission(respondent, answers(json!({ "q1": "hi" }))).unwrap();
        assert_eq!(record.form_id, form.id);
        assert_eq!(record.respondent_id, Some(respondent));

        form.archive();
        let archived = form.accept_submission(respondent, answers(json!({ "q1": "hi" })));
        assert!(matches!(archived, Err(FormsError::NotAcceptingResponses)));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = UserAccount::new("a@example.com", "Ann", "$argon2id$secret".into());
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["email"], "a@example.com");
    }

    #[test]
    fn test_contact_message_requires_every_field() {
        let msg = ContactMessage::new(" Ann ", "ann@example.com", "Hello").unwrap();
        assert_eq!(msg.name, "Ann");

        for (name, email, message) in [("", "a@b.co", "Hi"), ("Ann", " ", "Hi"), ("Ann", "a@b.co", "")] {
            assert!(matches!(
                ContactMessage::new(name, email, message),
                Err(FormsError::Validation(m)) if m == "Missing fields"
            ));
        }
    }
}
