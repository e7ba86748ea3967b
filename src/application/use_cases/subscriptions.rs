use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators,
    domain::entities::{
        session::Session,
        subscription::{BillingCycle, SubscriptionProfile, SubscriptionView},
    },
    use_cases::{
        accounts::AccountRepo,
        sharing::{InviteRepo, ShareRepo},
    },
};

/// Average weeks per month used for monthly normalization.
const WEEKS_PER_MONTH: f64 = 4.33;
const DAYS_PER_MONTH: f64 = 30.0;
const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionInput {
    pub name: String,
    pub description: Option<String>,
    pub cost_cents: i64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    pub payment_method_id: Uuid,
    pub category: String,
    pub website: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub max_slots: Option<i32>,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost_cents: Option<i64>,
    pub currency: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub next_billing_date: Option<NaiveDate>,
    pub payment_method_id: Option<Uuid>,
    pub category: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
    pub max_slots: Option<i32>,
}

/// One partitioned collection of subscriptions. Create and update must
/// reject a `payment_method_id` that does not resolve inside the same
/// owner partition (`InvalidReference`).
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<SubscriptionProfile>>;
    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<SubscriptionProfile>>;
    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile>;
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()>;
}

/// Remote-only unscoped lookup, for resolving shares into the subscriptions
/// they point at. Deliberately not part of `SubscriptionStore`: the guest
/// store has no cross-device index and never needs one.
#[async_trait]
pub trait SubscriptionDirectory: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    pub currency: String,
    pub monthly_cents: i64,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    guest: Arc<dyn SubscriptionStore>,
    account: Arc<dyn SubscriptionStore>,
    directory: Arc<dyn SubscriptionDirectory>,
    shares: Arc<dyn ShareRepo>,
    invites: Arc<dyn InviteRepo>,
    accounts: Arc<dyn AccountRepo>,
}

impl SubscriptionUseCases {
    pub fn new(
        guest: Arc<dyn SubscriptionStore>,
        account: Arc<dyn SubscriptionStore>,
        directory: Arc<dyn SubscriptionDirectory>,
        shares: Arc<dyn ShareRepo>,
        invites: Arc<dyn InviteRepo>,
        accounts: Arc<dyn AccountRepo>,
    ) -> Self {
        Self {
            guest,
            account,
            directory,
            shares,
            invites,
            accounts,
        }
    }

    fn store(&self, session: &Session) -> &dyn SubscriptionStore {
        match session {
            Session::Guest { .. } => self.guest.as_ref(),
            Session::Account { .. } => self.account.as_ref(),
        }
    }

    /// Own subscriptions, plus (for accounts, unless disabled) reduced views
    /// of subscriptions shared with the caller.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        session: &Session,
        active_only: bool,
        include_shared: bool,
    ) -> AppResult<Vec<SubscriptionView>> {
        let mut views: Vec<SubscriptionView> = self
            .store(session)
            .list(session.owner_id())
            .await?
            .into_iter()
            .filter(|s| !active_only || s.is_active)
            .map(SubscriptionView::owned)
            .collect();

        if include_shared {
            if let Some(account_id) = session.account_id() {
                for share in self.shares.list_for_beneficiary(account_id).await? {
                    if share.is_hidden {
                        continue;
                    }
                    let Some(profile) = self.directory.get_by_id(share.subscription_id).await?
                    else {
                        continue;
                    };
                    if active_only && !profile.is_active {
                        continue;
                    }
                    let owner_name = self.owner_label(profile.owner_id).await?;
                    views.push(SubscriptionView::shared(profile, share.id, owner_name));
                }
            }
        }

        Ok(views)
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        session: &Session,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        validate_create(input)?;
        let mut input = input.clone();
        input.currency = input.currency.to_uppercase();
        self.store(session).create(session.owner_id(), &input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        input: &UpdateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        validate_update(input)?;
        let mut input = input.clone();
        input.currency = input.currency.map(|c| c.to_uppercase());
        self.store(session)
            .update(session.owner_id(), id, &input)
            .await
    }

    /// Shares and invites go first, then the row itself, so nothing can
    /// resolve against a dangling subscription id in between.
    #[instrument(skip(self))]
    pub async fn delete(&self, session: &Session, id: Uuid) -> AppResult<()> {
        if session.is_account() {
            if self.store(session).get(session.owner_id(), id).await?.is_none() {
                return Err(AppError::NotFound);
            }
            let removed_shares = self.shares.delete_for_subscription(id).await?;
            let removed_invites = self.invites.delete_for_subscription(id).await?;
            if removed_shares > 0 || removed_invites > 0 {
                tracing::debug!(
                    subscription = %id,
                    removed_shares,
                    removed_invites,
                    "cascaded share/invite cleanup"
                );
            }
        }
        self.store(session).delete(session.owner_id(), id).await
    }

    /// Per-currency sum of active subscriptions' monthly equivalents. No
    /// cross-currency conversion; one total per currency, currency-sorted.
    pub async fn total_monthly_cost(&self, session: &Session) -> AppResult<Vec<CurrencyTotal>> {
        let subscriptions = self.store(session).list(session.owner_id()).await?;
        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for sub in subscriptions.iter().filter(|s| s.is_active) {
            *totals.entry(sub.currency.clone()).or_insert(0.0) +=
                monthly_equivalent_cents(sub.cost_cents, sub.billing_cycle);
        }
        Ok(totals
            .into_iter()
            .map(|(currency, cents)| CurrencyTotal {
                currency,
                monthly_cents: cents.round() as i64,
            })
            .collect())
    }

    /// Active subscriptions billing within the window, soonest first.
    pub async fn upcoming_bills(
        &self,
        session: &Session,
        window_days: i64,
    ) -> AppResult<Vec<SubscriptionProfile>> {
        let horizon = Utc::now().date_naive() + Duration::days(window_days.max(0));
        let mut due: Vec<SubscriptionProfile> = self
            .store(session)
            .list(session.owner_id())
            .await?
            .into_iter()
            .filter(|s| s.is_active && s.next_billing_date <= horizon)
            .collect();
        due.sort_by_key(|s| s.next_billing_date);
        Ok(due)
    }

    async fn owner_label(&self, owner_id: Uuid) -> AppResult<String> {
        Ok(self
            .accounts
            .get_by_id(owner_id)
            .await?
            .map(|account| account.display_label())
            .unwrap_or_else(|| "unknown".to_string()))
    }
}

/// Monthly-equivalent cost in cents, as f64 so callers accumulate first and
/// round once at the end.
pub(crate) fn monthly_equivalent_cents(cost_cents: i64, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Monthly => cost_cents as f64,
        BillingCycle::Yearly => cost_cents as f64 / MONTHS_PER_YEAR,
        BillingCycle::Weekly => cost_cents as f64 * WEEKS_PER_MONTH,
        BillingCycle::Daily => cost_cents as f64 * DAYS_PER_MONTH,
    }
}

fn validate_create(input: &CreateSubscriptionInput) -> AppResult<()> {
    if !validators::is_valid_label(&input.name) {
        return Err(AppError::InvalidInput("Invalid subscription name".into()));
    }
    if !validators::is_valid_label(&input.category) {
        return Err(AppError::InvalidInput("Invalid category".into()));
    }
    if !validators::is_valid_currency(&input.currency) {
        return Err(AppError::InvalidInput("Invalid currency code".into()));
    }
    if input.cost_cents < 0 {
        return Err(AppError::InvalidInput("Cost cannot be negative".into()));
    }
    if let Some(website) = &input.website {
        if !validators::is_valid_url(website) {
            return Err(AppError::InvalidInput("Invalid website URL".into()));
        }
    }
    if let Some(max_slots) = input.max_slots {
        if max_slots < 1 {
            return Err(AppError::InvalidInput("maxSlots must be positive".into()));
        }
    }
    Ok(())
}

fn validate_update(input: &UpdateSubscriptionInput) -> AppResult<()> {
    if let Some(name) = &input.name {
        if !validators::is_valid_label(name) {
            return Err(AppError::InvalidInput("Invalid subscription name".into()));
        }
    }
    if let Some(category) = &input.category {
        if !validators::is_valid_label(category) {
            return Err(AppError::InvalidInput("Invalid category".into()));
        }
    }
    if let Some(currency) = &input.currency {
        if !validators::is_valid_currency(currency) {
            return Err(AppError::InvalidInput("Invalid currency code".into()));
        }
    }
    if let Some(cost) = input.cost_cents {
        if cost < 0 {
            return Err(AppError::InvalidInput("Cost cannot be negative".into()));
        }
    }
    if let Some(website) = &input.website {
        if !validators::is_valid_url(website) {
            return Err(AppError::InvalidInput("Invalid website URL".into()));
        }
    }
    if let Some(max_slots) = input.max_slots {
        if max_slots < 1 {
            return Err(AppError::InvalidInput("maxSlots must be positive".into()));
        }
    }
    Ok(())
}
