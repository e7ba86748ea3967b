//! The Local Store: one Redis hash pair per device, JSON rows keyed by row
//! id, TTL-refreshed on every write. Ids minted here are meaningful on this
//! device only; migration re-keys everything on its way into Postgres.
//!
//! Reads and writes are plain read-modify-write: a device is one browser
//! session, and multiple tabs racing on default rebalancing is an accepted
//! limitation rather than something this store locks against.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::warn;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        payment_method::PaymentMethodProfile, subscription::SubscriptionProfile,
    },
    use_cases::{
        migration::{GuestSnapshot, GuestSnapshotSource},
        payment_methods::{
            CreatePaymentMethodInput, PaymentMethodStore, UpdatePaymentMethodInput,
        },
        subscriptions::{
            CreateSubscriptionInput, SubscriptionStore, UpdateSubscriptionInput,
        },
    },
};

#[derive(Clone)]
pub struct RedisGuestStore {
    manager: ConnectionManager,
    ttl_secs: i64,
}

fn store_err(e: redis::RedisError) -> AppError {
    AppError::Database(format!("Guest store error: {e}"))
}

fn encode_err(e: serde_json::Error) -> AppError {
    AppError::Internal(format!("Guest row encoding failed: {e}"))
}

impl RedisGuestStore {
    pub async fn new(redis_url: &str, ttl_days: i64) -> AppResult<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            AppError::Internal(format!(
                "Redis connection failed (check redis password/URL): {e}"
            ))
        })?;
        let manager = ConnectionManager::new(client).await.map_err(|e| {
            AppError::Internal(format!(
                "Redis auth/connection failed (check redis password/URL): {e}"
            ))
        })?;

        Ok(Self {
            manager,
            ttl_secs: ttl_days.max(1) * 24 * 60 * 60,
        })
    }

    fn methods_key(device_id: Uuid) -> String {
        format!("guest:{device_id}:payment_methods")
    }

    fn subscriptions_key(device_id: Uuid) -> String {
        format!("guest:{device_id}:subscriptions")
    }

    async fn read_methods(&self, device_id: Uuid) -> AppResult<Vec<PaymentMethodProfile>> {
        let mut conn = self.manager.clone();
        let raw: HashMap<String, String> = conn
            .hgetall(Self::methods_key(device_id))
            .await
            .map_err(store_err)?;
        let mut rows = Vec::with_capacity(raw.len());
        for (field, value) in raw {
            match serde_json::from_str::<PaymentMethodProfile>(&value) {
                Ok(profile) => rows.push(profile),
                // A corrupt row loses itself, not the device.
                Err(err) => warn!(
                    device = %device_id,
                    field,
                    error = %err,
                    "dropping unreadable guest payment method row"
                ),
            }
        }
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn read_subscriptions(&self, device_id: Uuid) -> AppResult<Vec<SubscriptionProfile>> {
        let mut conn = self.manager.clone();
        let raw: HashMap<String, String> = conn
            .hgetall(Self::subscriptions_key(device_id))
            .await
            .map_err(store_err)?;
        let mut rows = Vec::with_capacity(raw.len());
        for (field, value) in raw {
            match serde_json::from_str::<SubscriptionProfile>(&value) {
                Ok(profile) => rows.push(profile),
                Err(err) => warn!(
                    device = %device_id,
                    field,
                    error = %err,
                    "dropping unreadable guest subscription row"
                ),
            }
        }
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn write_method(
        &self,
        device_id: Uuid,
        profile: &PaymentMethodProfile,
    ) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let key = Self::methods_key(device_id);
        let payload = serde_json::to_string(profile).map_err(encode_err)?;
        let _: () = conn
            .hset(&key, profile.id.to_string(), payload)
            .await
            .map_err(store_err)?;
        let _: () = conn.expire(&key, self.ttl_secs).await.map_err(store_err)?;
        Ok(())
    }

    async fn write_subscription(
        &self,
        device_id: Uuid,
        profile: &SubscriptionProfile,
    ) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let key = Self::subscriptions_key(device_id);
        let payload = serde_json::to_string(profile).map_err(encode_err)?;
        let _: () = conn
            .hset(&key, profile.id.to_string(), payload)
            .await
            .map_err(store_err)?;
        let _: () = conn.expire(&key, self.ttl_secs).await.map_err(store_err)?;
        Ok(())
    }

    async fn has_method(&self, device_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        conn.hexists(Self::methods_key(device_id), id.to_string())
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl PaymentMethodStore for RedisGuestStore {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<PaymentMethodProfile>> {
        self.read_methods(owner_id).await
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<PaymentMethodProfile>> {
        Ok(self
            .read_methods(owner_id)
            .await?
            .into_iter()
            .find(|m| m.id == id))
    }

    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let siblings = self.read_methods(owner_id).await?;
        let will_default = input.is_default || siblings.is_empty();
        if will_default {
            for mut sibling in siblings.into_iter().filter(|m| m.is_default) {
                sibling.is_default = false;
                self.write_method(owner_id, &sibling).await?;
            }
        }

        let now = Utc::now().naive_utc();
        let profile = PaymentMethodProfile {
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
        self.write_method(owner_id, &profile).await?;
        Ok(profile)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let methods = self.read_methods(owner_id).await?;
        let Some(mut profile) = methods.iter().find(|m| m.id == id).cloned() else {
            return Err(AppError::NotFound);
        };
        if input.is_default == Some(true) {
            for mut sibling in methods.into_iter().filter(|m| m.is_default && m.id != id) {
                sibling.is_default = false;
                self.write_method(owner_id, &sibling).await?;
            }
        }
        if let Some(name) = &input.name {
            profile.name = name.trim().to_string();
        }
        if let Some(kind) = input.kind {
            profile.kind = kind;
        }
        if let Some(last_four) = &input.last_four {
            profile.last_four = Some(last_four.clone());
        }
        if let Some(expiry_date) = &input.expiry_date {
            profile.expiry_date = Some(expiry_date.clone());
        }
        if let Some(is_default) = input.is_default {
            profile.is_default = is_default;
        }
        profile.updated_at = Utc::now().naive_utc();
        self.write_method(owner_id, &profile).await?;
        Ok(profile)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let methods = self.read_methods(owner_id).await?;
        let Some(removed) = methods.iter().find(|m| m.id == id).cloned() else {
            return Err(AppError::NotFound);
        };

        let mut conn = self.manager.clone();
        let _: () = conn
            .hdel(Self::methods_key(owner_id), id.to_string())
            .await
            .map_err(store_err)?;

        if removed.is_default {
            // Promote the most recently created survivor.
            if let Some(mut successor) = methods
                .into_iter()
                .filter(|m| m.id != id)
                .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            {
                successor.is_default = true;
                self.write_method(owner_id, &successor).await?;
            }
        }
        Ok(())
    }

    async fn set_default(&self, owner_id: Uuid, id: Uuid) -> AppResult<PaymentMethodProfile> {
        let methods = self.read_methods(owner_id).await?;
        if !methods.iter().any(|m| m.id == id) {
            return Err(AppError::NotFound);
        }
        let mut updated = None;
        for mut method in methods {
            let should_default = method.id == id;
            if method.is_default != should_default {
                method.is_default = should_default;
                method.updated_at = Utc::now().naive_utc();
                self.write_method(owner_id, &method).await?;
            }
            if should_default {
                updated = Some(method);
            }
        }
        updated.ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl SubscriptionStore for RedisGuestStore {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<SubscriptionProfile>> {
        self.read_subscriptions(owner_id).await
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self
            .read_subscriptions(owner_id)
            .await?
            .into_iter()
            .find(|s| s.id == id))
    }

    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if !self.has_method(owner_id, input.payment_method_id).await? {
            return Err(AppError::InvalidReference(
                "paymentMethodId does not resolve for this owner".into(),
            ));
        }
        let now = Utc::now().naive_utc();
        let profile = SubscriptionProfile {
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
        self.write_subscription(owner_id, &profile).await?;
        Ok(profile)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if let Some(payment_method_id) = input.payment_method_id {
            if !self.has_method(owner_id, payment_method_id).await? {
                return Err(AppError::InvalidReference(
                    "paymentMethodId does not resolve for this owner".into(),
                ));
            }
        }
        let Some(mut profile) = SubscriptionStore::get(self, owner_id, id).await? else {
            return Err(AppError::NotFound);
        };
        if let Some(name) = &input.name {
            profile.name = name.trim().to_string();
        }
        if let Some(description) = &input.description {
            profile.description = Some(description.clone());
        }
        if let Some(cost_cents) = input.cost_cents {
            profile.cost_cents = cost_cents;
        }
        if let Some(currency) = &input.currency {
            profile.currency = currency.clone();
        }
        if let Some(billing_cycle) = input.billing_cycle {
            profile.billing_cycle = billing_cycle;
        }
        if let Some(next_billing_date) = input.next_billing_date {
            profile.next_billing_date = next_billing_date;
        }
        if let Some(payment_method_id) = input.payment_method_id {
            profile.payment_method_id = payment_method_id;
        }
        if let Some(category) = &input.category {
            profile.category = category.trim().to_string();
        }
        if let Some(website) = &input.website {
            profile.website = Some(website.clone());
        }
        if let Some(notes) = &input.notes {
            profile.notes = Some(notes.clone());
        }
        if let Some(is_active) = input.is_active {
            profile.is_active = is_active;
        }
        if let Some(max_slots) = input.max_slots {
            profile.max_slots = Some(max_slots);
        }
        profile.updated_at = Utc::now().naive_utc();
        self.write_subscription(owner_id, &profile).await?;
        Ok(profile)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn
            .hdel(Self::subscriptions_key(owner_id), id.to_string())
            .await
            .map_err(store_err)?;
        if removed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GuestSnapshotSource for RedisGuestStore {
    async fn snapshot(&self, device_id: Uuid) -> AppResult<GuestSnapshot> {
        Ok(GuestSnapshot {
            payment_methods: self.read_methods(device_id).await?,
            subscriptions: self.read_subscriptions(device_id).await?,
        })
    }

    async fn clear(&self, device_id: Uuid) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(&[
                Self::methods_key(device_id),
                Self::subscriptions_key(device_id),
            ])
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
