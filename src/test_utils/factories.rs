//! Test data factories for creating valid test fixtures.
//!
//! Each factory creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{Duration, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    account::AccountProfile,
    invite::InviteProfile,
    payment_method::{PaymentMethodKind, PaymentMethodProfile},
    share::{ShareKind, ShareProfile},
    subscription::{BillingCycle, SubscriptionProfile},
};

pub fn test_datetime() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn create_test_account(overrides: impl FnOnce(&mut AccountProfile)) -> AccountProfile {
    let mut account = AccountProfile {
        id: Uuid::new_v4(),
        email: format!("user-{}@example.com", Uuid::new_v4().simple()),
        display_name: None,
        created_at: test_datetime(),
    };
    overrides(&mut account);
    account
}

pub fn create_test_payment_method(
    owner_id: Uuid,
    overrides: impl FnOnce(&mut PaymentMethodProfile),
) -> PaymentMethodProfile {
    let now = test_datetime();
    let mut method = PaymentMethodProfile {
        id: Uuid::new_v4(),
        owner_id,
        name: "Visa".to_string(),
        kind: PaymentMethodKind::CreditCard,
        last_four: Some("4242".to_string()),
        expiry_date: Some("12/27".to_string()),
        is_default: false,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut method);
    method
}

pub fn create_test_subscription(
    owner_id: Uuid,
    payment_method_id: Uuid,
    overrides: impl FnOnce(&mut SubscriptionProfile),
) -> SubscriptionProfile {
    let now = test_datetime();
    let mut subscription = SubscriptionProfile {
        id: Uuid::new_v4(),
        owner_id,
        name: "Streaming Plus".to_string(),
        description: None,
        cost_cents: 999,
        currency: "USD".to_string(),
        billing_cycle: BillingCycle::Monthly,
        next_billing_date: Utc::now().date_naive() + Duration::days(30),
        payment_method_id,
        category: "streaming".to_string(),
        website: None,
        notes: None,
        is_active: true,
        max_slots: None,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut subscription);
    subscription
}

pub fn create_test_share(
    subscription_id: Uuid,
    overrides: impl FnOnce(&mut ShareProfile),
) -> ShareProfile {
    let mut share = ShareProfile {
        id: Uuid::new_v4(),
        subscription_id,
        kind: ShareKind::Named,
        name: Some("roommate".to_string()),
        beneficiary_account_id: None,
        is_hidden: false,
        created_at: test_datetime(),
    };
    overrides(&mut share);
    share
}

pub fn create_test_invite(
    subscription_id: Uuid,
    overrides: impl FnOnce(&mut InviteProfile),
) -> InviteProfile {
    let now = test_datetime();
    let mut invite = InviteProfile {
        id: Uuid::new_v4(),
        subscription_id,
        token_hash: format!("hash-{}", Uuid::new_v4().simple()),
        expires_at: now + Duration::days(7),
        claimed_by_account_id: None,
        claimed_at: None,
        created_at: now,
    };
    overrides(&mut invite);
    invite
}
