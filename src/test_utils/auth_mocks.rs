//! In-memory account repo, login-token store and a recording mail sink.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::account::AccountProfile,
    use_cases::accounts::{AccountRepo, EmailSender, MagicLinkStore},
};

#[derive(Default)]
pub struct InMemoryAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, AccountProfile>>,
}

impl InMemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: AccountProfile) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }
}

#[async_trait]
impl AccountRepo for InMemoryAccountRepo {
    async fn find_or_create_by_email(&self, email: &str) -> AppResult<AccountProfile> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(existing) = accounts.values().find(|a| a.email == email) {
            return Ok(existing.clone());
        }
        let account = AccountProfile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: None,
            created_at: Utc::now().naive_utc(),
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<AccountProfile>> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn set_display_name(&self, id: Uuid, display_name: &str) -> AppResult<AccountProfile> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(&id).ok_or(AppError::NotFound)?;
        account.display_name = Some(display_name.to_string());
        Ok(account.clone())
    }
}

/// TTL is ignored here; expiry behavior belongs to the Redis adapter and is
/// not what these tests exercise.
#[derive(Default)]
pub struct InMemoryMagicLinkStore {
    pub tokens: Mutex<HashMap<String, Uuid>>,
}

impl InMemoryMagicLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MagicLinkStore for InMemoryMagicLinkStore {
    async fn save(&self, token_hash: &str, account_id: Uuid, _ttl_minutes: i64) -> AppResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token_hash.to_string(), account_id);
        Ok(())
    }

    async fn consume(&self, token_hash: &str) -> AppResult<Option<Uuid>> {
        Ok(self.tokens.lock().unwrap().remove(token_hash))
    }
}

/// Records every (to, subject, body) it is asked to send; optionally fails
/// to exercise best-effort paths.
#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<(String, String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Internal("mail sink unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}
