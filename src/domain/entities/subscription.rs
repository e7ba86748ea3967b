use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_cycle", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Weekly,
    Daily,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
            BillingCycle::Weekly => "weekly",
            BillingCycle::Daily => "daily",
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            "weekly" => Ok(BillingCycle::Weekly),
            "daily" => Ok(BillingCycle::Daily),
            _ => Err(format!("Invalid billing cycle: {}", s)),
        }
    }
}

/// A tracked recurring subscription. Money is integer cents; the currency is
/// an ISO-4217 code and sums never cross currencies.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
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
    pub is_active: bool,
    pub max_slots: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// What list endpoints return: either the caller's own subscription in full,
/// or a reduced view of someone else's that was shared with the caller.
/// The reduced constructor is the only place redaction happens, so a shared
/// view cannot leak the owner's payment method, website or notes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cost_cents: i64,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub next_billing_date: NaiveDate,
    pub category: String,
    pub is_active: bool,
    pub max_slots: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_shared_with_me: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl SubscriptionView {
    pub fn owned(profile: SubscriptionProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            description: profile.description,
            cost_cents: profile.cost_cents,
            currency: profile.currency,
            billing_cycle: profile.billing_cycle,
            next_billing_date: profile.next_billing_date,
            category: profile.category,
            is_active: profile.is_active,
            max_slots: profile.max_slots,
            payment_method_id: Some(profile.payment_method_id),
            website: profile.website,
            notes: profile.notes,
            is_shared_with_me: false,
            share_id: None,
            owner_name: None,
        }
    }

    pub fn shared(profile: SubscriptionProfile, share_id: Uuid, owner_name: String) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            description: profile.description,
            cost_cents: profile.cost_cents,
            currency: profile.currency,
            billing_cycle: profile.billing_cycle,
            next_billing_date: profile.next_billing_date,
            category: profile.category,
            is_active: profile.is_active,
            max_slots: profile.max_slots,
            payment_method_id: None,
            website: None,
            notes: None,
            is_shared_with_me: true,
            share_id: Some(share_id),
            owner_name: Some(owner_name),
        }
    }
}
