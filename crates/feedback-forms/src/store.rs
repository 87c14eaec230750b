//! Stores - persistence abstraction for forms, responses, accounts and
//! contact messages
//!
//! Handlers receive the stores as trait objects, so the backing engine is
//! chosen at startup. The in-memory implementations back tests and
//! single-node development runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{ContactMessage, FormDocument, ResponseRecord, UserAccount};

/// Store result type
pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Form documents
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Insert or replace. Share codes are unique across forms.
    async fn save(&self, form: &FormDocument) -> RepoResult<()>;

    async fn get(&self, id: Uuid) -> RepoResult<Option<FormDocument>>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Forms owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<FormDocument>>;

    async fn find_by_share_code(&self, code: &str) -> RepoResult<Option<FormDocument>>;
}

/// Submitted responses
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Store a new response. A respondent may answer a form once.
    async fn insert(&self, response: &ResponseRecord) -> RepoResult<()>;

    async fn get(&self, id: Uuid) -> RepoResult<Option<ResponseRecord>>;

    /// Responses to a form, newest first.
    async fn list_by_form(&self, form_id: Uuid) -> RepoResult<Vec<ResponseRecord>>;

    /// Responses submitted by a user, newest first.
    async fn list_by_respondent(&self, respondent_id: Uuid) -> RepoResult<Vec<ResponseRecord>>;

    async fn find_by_respondent(
        &self,
        form_id: Uuid,
        respondent_id: Uuid,
    ) -> RepoResult<Option<ResponseRecord>>;

    /// Returns whether a response was removed.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;

    /// Returns how many responses were removed.
    async fn delete_by_form(&self, form_id: Uuid) -> RepoResult<usize>;
}

/// Registered accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new account. Emails are unique.
    async fn insert(&self, user: &UserAccount) -> RepoResult<()>;

    async fn save(&self, user: &UserAccount) -> RepoResult<()>;

    async fn get(&self, id: Uuid) -> RepoResult<Option<UserAccount>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserAccount>>;
}

/// Contact form submissions
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert(&self, message: &ContactMessage) -> RepoResult<()>;
    /// Newest first.
    async fn list(&self) -> RepoResult<Vec<ContactMessage>>;
}

/// In-memory form store
#[derive(Default)]
pub struct InMemoryFormStore {
    forms: RwLock<HashMap<Uuid, FormDocument>>,
}

impl InMemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn save(&self, form: &FormDocument) -> RepoResult<()> {
        let mut forms = self.forms.write();
        if let Some(code) = &form.share_code {
            let taken = forms
                .values()
                .any(|f| f.id != form.id && f.share_code.as_ref() == Some(code));
            if taken {
                return Err(RepositoryError::Conflict(format!("share code {code}")));
            }
        }
        forms.insert(form.id, form.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<FormDocument>> {
        Ok(self.forms.read().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.forms
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<FormDocument>> {
        let mut forms: Vec<_> = self
            .forms
            .read()
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(forms)
    }

    async fn find_by_share_code(&self, code: &str) -> RepoResult<Option<FormDocument>> {
        Ok(self
            .forms
            .read()
            .values()
            .find(|f| f.share_code.as_deref() == Some(code))
            .cloned())
    }
}

/// In-memory response store
#[derive(Default)]
pub struct InMemoryResponseStore {
    responses: RwLock<HashMap<Uuid, ResponseRecord>>,
}

impl InMemoryResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect_newest_first<F>(&self, filter: F) -> Vec<ResponseRecord>
    where
        F: Fn(&ResponseRecord) -> bool,
    {
        let mut found: Vec<_> = self
            .responses
            .read()
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        found
    }
}

#[async_trait]
impl ResponseStore for InMemoryResponseStore {
    async fn insert(&self, response: &ResponseRecord) -> RepoResult<()> {
        let mut responses = self.responses.write();
        if let Some(respondent) = response.respondent_id {
            let duplicate = responses
                .values()
                .any(|r| r.form_id == response.form_id && r.respondent_id == Some(respondent));
            if duplicate {
                return Err(RepositoryError::Conflict(format!(
                    "respondent {respondent} already answered form {}",
                    response.form_id
                )));
            }
        }
        if responses.contains_key(&response.id) {
            return Err(RepositoryError::Conflict(format!("response {}", response.id)));
        }
        responses.insert(response.id, response.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<ResponseRecord>> {
        Ok(self.responses.read().get(&id).cloned())
    }

    async fn list_by_form(&self, form_id: Uuid) -> RepoResult<Vec<ResponseRecord>> {
        Ok(self.collect_newest_first(|r| r.form_id == form_id))
    }

    async fn list_by_respondent(&self, respondent_id: Uuid) -> RepoResult<Vec<ResponseRecord>> {
        Ok(self.collect_newest_first(|r| r.respondent_id == Some(respondent_id)))
    }

    async fn find_by_respondent(
        &self,
        form_id: Uuid,
        respondent_id: Uuid,
    ) -> RepoResult<Option<ResponseRecord>> {
        Ok(self
            .responses
            .read()
            .values()
            .find(|r| r.form_id == form_id && r.respondent_id == Some(respondent_id))
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.responses.write().remove(&id).is_some())
    }

    async fn delete_by_form(&self, form_id: Uuid) -> RepoResult<usize> {
        let mut responses = self.responses.write();
        let before = responses.len();
        responses.retain(|_, r| r.form_id != form_id);
        Ok(before - responses.len())
    }
}

/// In-memory account store
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserAccount>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &UserAccount) -> RepoResult<()> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepositoryError::Conflict(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save(&self, user: &UserAccount) -> RepoResult<()> {
        let mut users = self.users.write();
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<UserAccount>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserAccount>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

/// In-memory contact message store
#[derive(Default)]
pub struct InMemoryContactStore {
    messages: RwLock<Vec<ContactMessage>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn insert(&self, message: &ContactMessage) -> RepoResult<()> {
        self.messages.write().push(message.clone());
        Ok(())
    }

    async fn list(&self) -> RepoResult<Vec<ContactMessage>> {
        let mut messages = self.messages.read().clone();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }
}
