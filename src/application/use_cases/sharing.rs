use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{email_templates, validators},
    domain::entities::{
        invite::{InviteProfile, InviteRejection},
        share::ShareProfile,
        subscription::{BillingCycle, SubscriptionProfile, SubscriptionView},
    },
    use_cases::{
        accounts::{AccountRepo, EmailSender, generate_token, hash_token},
        subscriptions::SubscriptionDirectory,
    },
};

#[async_trait]
pub trait ShareRepo: Send + Sync {
    async fn insert_named(&self, subscription_id: Uuid, name: &str) -> AppResult<ShareProfile>;
    async fn get(&self, id: Uuid) -> AppResult<Option<ShareProfile>>;
    async fn list_for_subscription(&self, subscription_id: Uuid)
    -> AppResult<Vec<ShareProfile>>;
    async fn count_for_subscription(&self, subscription_id: Uuid) -> AppResult<i64>;
    async fn list_for_beneficiary(&self, account_id: Uuid) -> AppResult<Vec<ShareProfile>>;
    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<ShareProfile>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64>;
}

#[async_trait]
pub trait InviteRepo: Send + Sync {
    async fn insert(
        &self,
        subscription_id: Uuid,
        token_hash: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<InviteProfile>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<InviteProfile>>;
    async fn get_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteProfile>>;
    async fn list_pending_for_subscription(
        &self,
        subscription_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Vec<InviteProfile>>;
    /// Atomically: mark the invite claimed iff it is still unclaimed and
    /// unexpired, and insert the resulting `user` share. Returns None when
    /// the conditional write hit nothing (lost race, late claim).
    async fn claim(
        &self,
        token_hash: &str,
        account_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<ShareProfile>>;
    /// Deletes iff still unclaimed; NotFound otherwise.
    async fn delete_unclaimed(&self, id: Uuid) -> AppResult<()>;
    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64>;
}

/// What `create_invite_link` hands back. The raw token exists nowhere else;
/// losing this response means minting a new invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvite {
    pub token: String,
    pub invite_url: String,
    pub invite: InviteProfile,
}

/// Public, unauthenticated preview of an invite. Invalid tokens still get a
/// 200-shaped answer with a reason, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteInfo {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InviteRejection>,
    #[serde(flatten)]
    pub preview: Option<InvitePreview>,
}

impl InviteInfo {
    fn invalid(reason: InviteRejection) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            preview: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePreview {
    pub subscription_name: String,
    pub cost_cents: i64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub owner_name: String,
    pub max_slots: Option<i32>,
}

/// Slot utilization for a shareable plan. `wasted_cents` is the slice of the
/// price paying for nobody.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationReport {
    pub subscription_id: Uuid,
    pub has_slots: bool,
    pub max_slots: Option<i32>,
    pub used_slots: i64,
    pub unused_slots: i64,
    pub wasted_cents: i64,
    pub cost_cents: i64,
    pub currency: String,
}

#[derive(Clone)]
pub struct SharingUseCases {
    directory: Arc<dyn SubscriptionDirectory>,
    shares: Arc<dyn ShareRepo>,
    invites: Arc<dyn InviteRepo>,
    accounts: Arc<dyn AccountRepo>,
    email: Arc<dyn EmailSender>,
    app_origin: String,
}

impl SharingUseCases {
    pub fn new(
        directory: Arc<dyn SubscriptionDirectory>,
        shares: Arc<dyn ShareRepo>,
        invites: Arc<dyn InviteRepo>,
        accounts: Arc<dyn AccountRepo>,
        email: Arc<dyn EmailSender>,
        app_origin: String,
    ) -> Self {
        Self {
            directory,
            shares,
            invites,
            accounts,
            email,
            app_origin,
        }
    }

    /// The subscription, iff the caller owns it. Someone else's id answers
    /// exactly like a missing one.
    async fn owned_subscription(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
    ) -> AppResult<SubscriptionProfile> {
        match self.directory.get_by_id(subscription_id).await? {
            Some(sub) if sub.owner_id == account_id => Ok(sub),
            _ => Err(AppError::NotFound),
        }
    }

    #[instrument(skip(self))]
    pub async fn add_named_share(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
        name: &str,
    ) -> AppResult<ShareProfile> {
        if !validators::is_valid_label(name) {
            return Err(AppError::InvalidInput("Invalid share name".into()));
        }
        self.owned_subscription(account_id, subscription_id).await?;
        // No uniqueness: two flatmates can both be "Sam".
        self.shares.insert_named(subscription_id, name.trim()).await
    }

    #[instrument(skip(self))]
    pub async fn create_invite_link(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
        ttl_days: i64,
    ) -> AppResult<CreatedInvite> {
        if !(1..=90).contains(&ttl_days) {
            return Err(AppError::InvalidInput(
                "Invite ttlDays must be between 1 and 90".into(),
            ));
        }
        self.owned_subscription(account_id, subscription_id).await?;

        let token = generate_token();
        let expires_at = Utc::now().naive_utc() + Duration::days(ttl_days);
        let invite = self
            .invites
            .insert(subscription_id, &hash_token(&token), expires_at)
            .await?;

        let invite_url = format!("{}/invite?token={}", self.app_origin, token);
        Ok(CreatedInvite {
            token,
            invite_url,
            invite,
        })
    }

    /// Unauthenticated. Redacted on purpose: enough for "do I want in", not
    /// enough to learn anything about the owner's billing.
    pub async fn get_invite_info(&self, raw_token: &str) -> AppResult<InviteInfo> {
        let now = Utc::now().naive_utc();
        let Some(invite) = self
            .invites
            .get_by_token_hash(&hash_token(raw_token))
            .await?
        else {
            return Ok(InviteInfo::invalid(InviteRejection::Unknown));
        };
        if let Some(reason) = invite.rejection(now) {
            return Ok(InviteInfo::invalid(reason));
        }
        let Some(sub) = self.directory.get_by_id(invite.subscription_id).await? else {
            return Ok(InviteInfo::invalid(InviteRejection::Unknown));
        };
        let owner_name = match self.accounts.get_by_id(sub.owner_id).await? {
            Some(owner) => owner.display_label(),
            None => "unknown".to_string(),
        };
        Ok(InviteInfo {
            valid: true,
            reason: None,
            preview: Some(InvitePreview {
                subscription_name: sub.name,
                cost_cents: sub.cost_cents,
                currency: sub.currency,
                billing_cycle: sub.billing_cycle,
                owner_name,
                max_slots: sub.max_slots,
            }),
        })
    }

    /// The claim itself is one conditional write in the repo; everything
    /// before it is advisory and only improves the error message.
    #[instrument(skip(self, raw_token))]
    pub async fn claim_invite(
        &self,
        account_id: Uuid,
        raw_token: &str,
    ) -> AppResult<ShareProfile> {
        let token_hash = hash_token(raw_token);
        let now = Utc::now().naive_utc();

        let invite = self
            .invites
            .get_by_token_hash(&token_hash)
            .await?
            .ok_or(AppError::InviteInvalid(InviteRejection::Unknown))?;
        if let Some(reason) = invite.rejection(now) {
            return Err(AppError::InviteInvalid(reason));
        }

        let share = self
            .invites
            .claim(&token_hash, account_id, now)
            .await?
            .ok_or(AppError::InviteInvalid(InviteRejection::AlreadyClaimed))?;

        if let Err(err) = self.notify_owner(&share, account_id).await {
            warn!(error = ?err, share = %share.id, "invite claim notification failed");
        }
        Ok(share)
    }

    async fn notify_owner(&self, share: &ShareProfile, claimant_id: Uuid) -> AppResult<()> {
        let Some(sub) = self.directory.get_by_id(share.subscription_id).await? else {
            return Ok(());
        };
        let Some(owner) = self.accounts.get_by_id(sub.owner_id).await? else {
            return Ok(());
        };
        let claimant_name = match self.accounts.get_by_id(claimant_id).await? {
            Some(claimant) => claimant.display_label(),
            None => "Someone".to_string(),
        };
        let (subject, body) = email_templates::invite_claimed(&sub.name, &claimant_name);
        self.email.send(&owner.email, &subject, &body).await
    }

    /// Owner-only. The originating invite, if any, stays claimed; only the
    /// slot goes away.
    #[instrument(skip(self))]
    pub async fn remove_share(&self, account_id: Uuid, share_id: Uuid) -> AppResult<()> {
        let share = self.shares.get(share_id).await?.ok_or(AppError::NotFound)?;
        self.owned_subscription(account_id, share.subscription_id)
            .await?;
        self.shares.delete(share_id).await
    }

    /// Beneficiary-only; flips visibility in that beneficiary's own views.
    #[instrument(skip(self))]
    pub async fn toggle_hide_share(
        &self,
        account_id: Uuid,
        share_id: Uuid,
    ) -> AppResult<ShareProfile> {
        let share = self.shares.get(share_id).await?.ok_or(AppError::NotFound)?;
        if share.beneficiary_account_id != Some(account_id) {
            return Err(AppError::NotFound);
        }
        self.shares.set_hidden(share_id, !share.is_hidden).await
    }

    /// Owner-only, unclaimed invites only: a claimed invite is the audit
    /// trail of an existing share and is rejected instead of deleted.
    #[instrument(skip(self))]
    pub async fn revoke_invite(&self, account_id: Uuid, invite_id: Uuid) -> AppResult<()> {
        let invite = self
            .invites
            .get_by_id(invite_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.owned_subscription(account_id, invite.subscription_id)
            .await?;
        if invite.is_claimed() {
            return Err(AppError::InviteInvalid(InviteRejection::AlreadyClaimed));
        }
        self.invites.delete_unclaimed(invite_id).await
    }

    pub async fn get_subscription_shares(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
    ) -> AppResult<Vec<ShareProfile>> {
        self.owned_subscription(account_id, subscription_id).await?;
        self.shares.list_for_subscription(subscription_id).await
    }

    pub async fn get_pending_invites(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
    ) -> AppResult<Vec<InviteProfile>> {
        self.owned_subscription(account_id, subscription_id).await?;
        self.invites
            .list_pending_for_subscription(subscription_id, Utc::now().naive_utc())
            .await
    }

    /// Everything shared *with* the caller, as reduced views.
    pub async fn get_shared_with_me(
        &self,
        account_id: Uuid,
        include_hidden: bool,
    ) -> AppResult<Vec<SubscriptionView>> {
        let mut views = Vec::new();
        for share in self.shares.list_for_beneficiary(account_id).await? {
            if share.is_hidden && !include_hidden {
                continue;
            }
            let Some(sub) = self.directory.get_by_id(share.subscription_id).await? else {
                continue;
            };
            let owner_name = match self.accounts.get_by_id(sub.owner_id).await? {
                Some(owner) => owner.display_label(),
                None => "unknown".to_string(),
            };
            views.push(SubscriptionView::shared(sub, share.id, owner_name));
        }
        Ok(views)
    }

    /// Slot utilization. Hidden shares still occupy their slot: hiding is a
    /// beneficiary's display preference, not a vacancy.
    pub async fn get_subscription_roi(
        &self,
        account_id: Uuid,
        subscription_id: Uuid,
    ) -> AppResult<UtilizationReport> {
        let sub = self.owned_subscription(account_id, subscription_id).await?;
        let Some(max_slots) = sub.max_slots else {
            return Ok(UtilizationReport {
                subscription_id,
                has_slots: false,
                max_slots: None,
                used_slots: 0,
                unused_slots: 0,
                wasted_cents: 0,
                cost_cents: sub.cost_cents,
                currency: sub.currency,
            });
        };

        let used_slots = self.shares.count_for_subscription(subscription_id).await?;
        let unused_slots = (max_slots as i64 - used_slots).max(0);
        let wasted_cents =
            (sub.cost_cents as f64 * unused_slots as f64 / max_slots as f64).round() as i64;
        Ok(UtilizationReport {
            subscription_id,
            has_slots: true,
            max_slots: Some(max_slots),
            used_slots,
            unused_slots,
            wasted_cents,
            cost_cents: sub.cost_cents,
            currency: sub.currency,
        })
    }
}
