//! One in-memory store implementing every store-side port. Instantiated
//! twice in tests: once as the guest store, once as the remote store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        payment_method::PaymentMethodProfile, subscription::SubscriptionProfile,
    },
    use_cases::{
        migration::{GuestSnapshot, GuestSnapshotSource, ImportSink},
        payment_methods::{
            CreatePaymentMethodInput, PaymentMethodStore, UpdatePaymentMethodInput,
        },
        subscriptions::{
            CreateSubscriptionInput, SubscriptionDirectory, SubscriptionStore,
            UpdateSubscriptionInput,
        },
    },
};

#[derive(Default)]
pub struct InMemoryStore {
    pub payment_methods: Mutex<HashMap<Uuid, PaymentMethodProfile>>,
    pub subscriptions: Mutex<HashMap<Uuid, SubscriptionProfile>>,
    // (owner_id, source_key) -> already-imported row id
    pub source_keys: Mutex<HashMap<(Uuid, String), Uuid>>,
    fail_subscription_imports: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a subscription bypassing reference validation, e.g. to model a
    /// corrupt device row.
    pub fn insert_subscription_raw(&self, subscription: SubscriptionProfile) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription);
    }

    /// Make subsequent `import_subscription` calls fail, to exercise
    /// mid-migration failures.
    pub fn fail_subscription_imports(&self, fail: bool) {
        *self.fail_subscription_imports.lock().unwrap() = fail;
    }

    fn sorted_payment_methods(&self, owner_id: Uuid) -> Vec<PaymentMethodProfile> {
        let mut rows: Vec<PaymentMethodProfile> = self
            .payment_methods
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }

    fn sorted_subscriptions(&self, owner_id: Uuid) -> Vec<SubscriptionProfile> {
        let mut rows: Vec<SubscriptionProfile> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }

    fn owns_payment_method(&self, owner_id: Uuid, id: Uuid) -> bool {
        self.payment_methods
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|m| m.owner_id == owner_id)
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryStore {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<PaymentMethodProfile>> {
        Ok(self.sorted_payment_methods(owner_id))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<PaymentMethodProfile>> {
        Ok(self
            .payment_methods
            .lock()
            .unwrap()
            .get(&id)
            .filter(|m| m.owner_id == owner_id)
            .cloned())
    }

    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let mut methods = self.payment_methods.lock().unwrap();
        let has_siblings = methods.values().any(|m| m.owner_id == owner_id);
        let will_default = input.is_default || !has_siblings;
        if will_default {
            for method in methods.values_mut().filter(|m| m.owner_id == owner_id) {
                method.is_default = false;
            }
        }

        let now = Utc::now().naive_utc();
        let method = PaymentMethodProfile {
            id: Uuid::new_v4(),
            owner_id,
            name: input.name.trim().to_string(),
            kind: input.kind,
            last_four: input.last_four.clone(),
            expiry_date: input.expiry_date.clone(),
            is_default: will_default,
            created_at: now,
            updated_at: now,
        };
        methods.insert(method.id, method.clone());
        Ok(method)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let mut methods = self.payment_methods.lock().unwrap();
        if !methods.get(&id).is_some_and(|m| m.owner_id == owner_id) {
            return Err(AppError::NotFound);
        }
        if input.is_default == Some(true) {
            for method in methods.values_mut().filter(|m| m.owner_id == owner_id) {
                method.is_default = false;
            }
        }
        let method = methods.get_mut(&id).expect("checked above");
        if let Some(name) = &input.name {
            method.name = name.trim().to_string();
        }
        if let Some(kind) = input.kind {
            method.kind = kind;
        }
        if let Some(last_four) = &input.last_four {
            method.last_four = Some(last_four.clone());
        }
        if let Some(expiry_date) = &input.expiry_date {
            method.expiry_date = Some(expiry_date.clone());
        }
        if let Some(is_default) = input.is_default {
            method.is_default = is_default;
        }
        method.updated_at = Utc::now().naive_utc();
        Ok(method.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let mut methods = self.payment_methods.lock().unwrap();
        if !methods.get(&id).is_some_and(|m| m.owner_id == owner_id) {
            return Err(AppError::NotFound);
        }
        let removed = methods.remove(&id).expect("checked above");
        if removed.is_default {
            // Promote the most recently created survivor.
            if let Some(successor_id) = methods
                .values()
                .filter(|m| m.owner_id == owner_id)
                .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
                .map(|m| m.id)
            {
                methods.get_mut(&successor_id).expect("just found").is_default = true;
            }
        }
        Ok(())
    }

    async fn set_default(&self, owner_id: Uuid, id: Uuid) -> AppResult<PaymentMethodProfile> {
        let mut methods = self.payment_methods.lock().unwrap();
        if !methods.get(&id).is_some_and(|m| m.owner_id == owner_id) {
            return Err(AppError::NotFound);
        }
        for method in methods.values_mut().filter(|m| m.owner_id == owner_id) {
            method.is_default = method.id == id;
        }
        Ok(methods.get(&id).expect("checked above").clone())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<SubscriptionProfile>> {
        Ok(self.sorted_subscriptions(owner_id))
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .get(&id)
            .filter(|s| s.owner_id == owner_id)
            .cloned())
    }

    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if !self.owns_payment_method(owner_id, input.payment_method_id) {
            return Err(AppError::InvalidReference(
                "paymentMethodId does not resolve for this owner".into(),
            ));
        }
        let now = Utc::now().naive_utc();
        let subscription = SubscriptionProfile {
            id: Uuid::new_v4(),
            owner_id,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            cost_cents: input.cost_cents,
            currency: input.currency.clone(),
            billing_cycle: input.billing_cycle,
            next_billing_date: input.next_billing_date,
            payment_method_id: input.payment_method_id,
            category: input.category.trim().to_string(),
            website: input.website.clone(),
            notes: input.notes.clone(),
            is_active: input.is_active,
            max_slots: input.max_slots,
            created_at: now,
            updated_at: now,
        };
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if let Some(payment_method_id) = input.payment_method_id {
            if !self.owns_payment_method(owner_id, payment_method_id) {
                return Err(AppError::InvalidReference(
                    "paymentMethodId does not resolve for this owner".into(),
                ));
            }
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let Some(subscription) = subscriptions
            .get_mut(&id)
            .filter(|s| s.owner_id == owner_id)
        else {
            return Err(AppError::NotFound);
        };
        if let Some(name) = &input.name {
            subscription.name = name.trim().to_string();
        }
        if let Some(description) = &input.description {
            subscription.description = Some(description.clone());
        }
        if let Some(cost_cents) = input.cost_cents {
            subscription.cost_cents = cost_cents;
        }
        if let Some(currency) = &input.currency {
            subscription.currency = currency.clone();
        }
        if let Some(billing_cycle) = input.billing_cycle {
            subscription.billing_cycle = billing_cycle;
        }
        if let Some(next_billing_date) = input.next_billing_date {
            subscription.next_billing_date = next_billing_date;
        }
        if let Some(payment_method_id) = input.payment_method_id {
            subscription.payment_method_id = payment_method_id;
        }
        if let Some(category) = &input.category {
            subscription.category = category.trim().to_string();
        }
        if let Some(website) = &input.website {
            subscription.website = Some(website.clone());
        }
        if let Some(notes) = &input.notes {
            subscription.notes = Some(notes.clone());
        }
        if let Some(is_active) = input.is_active {
            subscription.is_active = is_active;
        }
        if let Some(max_slots) = input.max_slots {
            subscription.max_slots = Some(max_slots);
        }
        subscription.updated_at = Utc::now().naive_utc();
        Ok(subscription.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if !subscriptions.get(&id).is_some_and(|s| s.owner_id == owner_id) {
            return Err(AppError::NotFound);
        }
        subscriptions.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SubscriptionDirectory for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl GuestSnapshotSource for InMemoryStore {
    async fn snapshot(&self, device_id: Uuid) -> AppResult<GuestSnapshot> {
        Ok(GuestSnapshot {
            payment_methods: self.sorted_payment_methods(device_id),
            subscriptions: self.sorted_subscriptions(device_id),
        })
    }

    async fn clear(&self, device_id: Uuid) -> AppResult<()> {
        self.payment_methods
            .lock()
            .unwrap()
            .retain(|_, m| m.owner_id != device_id);
        self.subscriptions
            .lock()
            .unwrap()
            .retain(|_, s| s.owner_id != device_id);
        Ok(())
    }
}

#[async_trait]
impl ImportSink for InMemoryStore {
    async fn import_payment_method(
        &self,
        account_id: Uuid,
        input: &CreatePaymentMethodInput,
        source_key: &str,
    ) -> AppResult<PaymentMethodProfile> {
        let key = (account_id, source_key.to_string());
        if let Some(existing_id) = self.source_keys.lock().unwrap().get(&key).copied() {
            if let Some(existing) = self.payment_methods.lock().unwrap().get(&existing_id) {
                return Ok(existing.clone());
            }
        }
        let created = PaymentMethodStore::create(self, account_id, input).await?;
        self.source_keys.lock().unwrap().insert(key, created.id);
        Ok(created)
    }

    async fn import_subscription(
        &self,
        account_id: Uuid,
        input: &CreateSubscriptionInput,
        source_key: &str,
    ) -> AppResult<SubscriptionProfile> {
        if *self.fail_subscription_imports.lock().unwrap() {
            return Err(AppError::Database("injected import failure".into()));
        }
        let key = (account_id, source_key.to_string());
        if let Some(existing_id) = self.source_keys.lock().unwrap().get(&key).copied() {
            if let Some(existing) = self.subscriptions.lock().unwrap().get(&existing_id) {
                return Ok(existing.clone());
            }
        }
        let created = SubscriptionStore::create(self, account_id, input).await?;
        self.source_keys.lock().unwrap().insert(key, created.id);
        Ok(created)
    }
}
