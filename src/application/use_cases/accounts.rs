use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{email_templates, validators},
    domain::entities::account::AccountProfile,
};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_or_create_by_email(&self, email: &str) -> AppResult<AccountProfile>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<AccountProfile>>;
    async fn set_display_name(&self, id: Uuid, display_name: &str) -> AppResult<AccountProfile>;
}

/// One-time login tokens, stored by digest with a TTL.
#[async_trait]
pub trait MagicLinkStore: Send + Sync {
    async fn save(&self, token_hash: &str, account_id: Uuid, ttl_minutes: i64) -> AppResult<()>;
    async fn consume(&self, token_hash: &str) -> AppResult<Option<Uuid>>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct AuthUseCases {
    accounts: Arc<dyn AccountRepo>,
    magic_links: Arc<dyn MagicLinkStore>,
    email: Arc<dyn EmailSender>,
    app_origin: String,
}

impl AuthUseCases {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        magic_links: Arc<dyn MagicLinkStore>,
        email: Arc<dyn EmailSender>,
        app_origin: String,
    ) -> Self {
        Self {
            accounts,
            magic_links,
            email,
            app_origin,
        }
    }

    #[instrument(skip(self))]
    pub async fn request_login(&self, email: &str, ttl_minutes: i64) -> AppResult<()> {
        if !validators::is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".into()));
        }

        let account = self.accounts.find_or_create_by_email(email.trim()).await?;
        let raw = generate_token();
        let token_hash = hash_token(&raw);
        self.magic_links
            .save(&token_hash, account.id, ttl_minutes)
            .await?;

        let link = format!("{}/login?token={}", self.app_origin, raw);
        let (subject, body) = email_templates::login_link(&link);
        self.email.send(&account.email, &subject, &body).await
    }

    /// Burns the token; returns the account it belonged to, or None for an
    /// unknown/expired/already-used token.
    #[instrument(skip(self, raw_token))]
    pub async fn consume_login(&self, raw_token: &str) -> AppResult<Option<Uuid>> {
        let token_hash = hash_token(raw_token);
        self.magic_links.consume(&token_hash).await
    }

    pub async fn get_account(&self, account_id: Uuid) -> AppResult<AccountProfile> {
        self.accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn rename_account(
        &self,
        account_id: Uuid,
        display_name: &str,
    ) -> AppResult<AccountProfile> {
        if !validators::is_valid_label(display_name) {
            return Err(AppError::InvalidInput("Invalid display name".into()));
        }
        self.accounts
            .set_display_name(account_id, display_name.trim())
            .await
    }
}

/// 32 bytes of OS randomness, URL-safe, no padding. Shared by login links
/// and share invites.
pub(crate) fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub(crate) fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
