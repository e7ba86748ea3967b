//! In-memory share and invite repos. The invite repo holds an Arc to the
//! share repo so `claim` can do its conditional-write-plus-insert as one
//! locked unit, the way the Postgres adapter does it in one statement.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        invite::InviteProfile,
        share::{ShareKind, ShareProfile},
    },
    use_cases::sharing::{InviteRepo, ShareRepo},
};

#[derive(Default)]
pub struct InMemoryShareRepo {
    pub shares: Mutex<HashMap<Uuid, ShareProfile>>,
}

impl InMemoryShareRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, share: ShareProfile) {
        self.shares.lock().unwrap().insert(share.id, share);
    }
}

#[async_trait]
impl ShareRepo for InMemoryShareRepo {
    async fn insert_named(&self, subscription_id: Uuid, name: &str) -> AppResult<ShareProfile> {
        let share = ShareProfile {
            id: Uuid::new_v4(),
            subscription_id,
            kind: ShareKind::Named,
            name: Some(name.to_string()),
            beneficiary_account_id: None,
            is_hidden: false,
            created_at: Utc::now().naive_utc(),
        };
        self.insert(share.clone());
        Ok(share)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<ShareProfile>> {
        Ok(self.shares.lock().unwrap().get(&id).cloned())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> AppResult<Vec<ShareProfile>> {
        let mut rows: Vec<ShareProfile> = self
            .shares
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.subscription_id == subscription_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn count_for_subscription(&self, subscription_id: Uuid) -> AppResult<i64> {
        Ok(self
            .shares
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.subscription_id == subscription_id)
            .count() as i64)
    }

    async fn list_for_beneficiary(&self, account_id: Uuid) -> AppResult<Vec<ShareProfile>> {
        let mut rows: Vec<ShareProfile> = self
            .shares
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.kind == ShareKind::User && s.beneficiary_account_id == Some(account_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<ShareProfile> {
        let mut shares = self.shares.lock().unwrap();
        let share = shares.get_mut(&id).ok_or(AppError::NotFound)?;
        share.is_hidden = hidden;
        Ok(share.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.shares
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64> {
        let mut shares = self.shares.lock().unwrap();
        let before = shares.len();
        shares.retain(|_, s| s.subscription_id != subscription_id);
        Ok((before - shares.len()) as u64)
    }
}

pub struct InMemoryInviteRepo {
    pub invites: Mutex<HashMap<Uuid, InviteProfile>>,
    shares: Arc<InMemoryShareRepo>,
}

impl InMemoryInviteRepo {
    pub fn new(shares: Arc<InMemoryShareRepo>) -> Self {
        Self {
            invites: Mutex::new(HashMap::new()),
            shares,
        }
    }

    /// Backdate an invite so expiry paths can be tested without sleeping.
    pub fn expire(&self, id: Uuid) {
        if let Some(invite) = self.invites.lock().unwrap().get_mut(&id) {
            invite.expires_at = Utc::now().naive_utc() - Duration::hours(1);
        }
    }
}

#[async_trait]
impl InviteRepo for InMemoryInviteRepo {
    async fn insert(
        &self,
        subscription_id: Uuid,
        token_hash: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<InviteProfile> {
        let invite = InviteProfile {
            id: Uuid::new_v4(),
            subscription_id,
            token_hash: token_hash.to_string(),
            expires_at,
            claimed_by_account_id: None,
            claimed_at: None,
            created_at: Utc::now().naive_utc(),
        };
        self.invites
            .lock()
            .unwrap()
            .insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<InviteProfile>> {
        Ok(self.invites.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteProfile>> {
        Ok(self
            .invites
            .lock()
            .unwrap()
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn list_pending_for_subscription(
        &self,
        subscription_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Vec<InviteProfile>> {
        let mut rows: Vec<InviteProfile> = self
            .invites
            .lock()
            .unwrap()
            .values()
            .filter(|i| {
                i.subscription_id == subscription_id && !i.is_claimed() && !i.is_expired(now)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn claim(
        &self,
        token_hash: &str,
        account_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<ShareProfile>> {
        // Both maps stay locked together for the duration: the conditional
        // update and the share insert are one unit, as in the SQL CTE.
        let mut invites = self.invites.lock().unwrap();
        let Some(invite) = invites
            .values_mut()
            .find(|i| i.token_hash == token_hash && !i.is_claimed() && !i.is_expired(now))
        else {
            return Ok(None);
        };
        invite.claimed_by_account_id = Some(account_id);
        invite.claimed_at = Some(now);

        let share = ShareProfile {
            id: Uuid::new_v4(),
            subscription_id: invite.subscription_id,
            kind: ShareKind::User,
            name: None,
            beneficiary_account_id: Some(account_id),
            is_hidden: false,
            created_at: now,
        };
        self.shares
            .shares
            .lock()
            .unwrap()
            .insert(share.id, share.clone());
        Ok(Some(share))
    }

    async fn delete_unclaimed(&self, id: Uuid) -> AppResult<()> {
        let mut invites = self.invites.lock().unwrap();
        match invites.get(&id) {
            Some(invite) if !invite.is_claimed() => {
                invites.remove(&id);
                Ok(())
            }
            _ => Err(AppError::NotFound),
        }
    }

    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64> {
        let mut invites = self.invites.lock().unwrap();
        let before = invites.len();
        invites.retain(|_, i| i.subscription_id != subscription_id);
        Ok((before - invites.len()) as u64)
    }
}
