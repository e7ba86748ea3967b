use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::{
        payment_method::PaymentMethodProfile, subscription::SubscriptionProfile,
    },
    use_cases::{
        payment_methods::CreatePaymentMethodInput, subscriptions::CreateSubscriptionInput,
    },
};

/// Everything one device holds, read in a single pass before any remote
/// write happens.
#[derive(Debug, Clone, Default)]
pub struct GuestSnapshot {
    pub payment_methods: Vec<PaymentMethodProfile>,
    pub subscriptions: Vec<SubscriptionProfile>,
}

impl GuestSnapshot {
    pub fn is_empty(&self) -> bool {
        self.payment_methods.is_empty() && self.subscriptions.is_empty()
    }
}

/// The migration-facing face of the guest store: read everything, wipe
/// everything. Wiping only happens after the remote write succeeded.
#[async_trait]
pub trait GuestSnapshotSource: Send + Sync {
    async fn snapshot(&self, device_id: Uuid) -> AppResult<GuestSnapshot>;
    async fn clear(&self, device_id: Uuid) -> AppResult<()>;
}

/// Idempotent insert into the remote store. `source_key` ties the new row to
/// the device row it came from; submitting the same key twice (a retried or
/// concurrently duplicated migration) returns the already-imported row
/// instead of creating a second one.
#[async_trait]
pub trait ImportSink: Send + Sync {
    async fn import_payment_method(
        &self,
        account_id: Uuid,
        input: &CreatePaymentMethodInput,
        source_key: &str,
    ) -> AppResult<PaymentMethodProfile>;

    async fn import_subscription(
        &self,
        account_id: Uuid,
        input: &CreateSubscriptionInput,
        source_key: &str,
    ) -> AppResult<SubscriptionProfile>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub payment_methods_migrated: usize,
    pub subscriptions_migrated: usize,
    /// Subscriptions whose local payment-method reference could not be
    /// resolved. Counted and skipped, never fatal.
    pub subscriptions_skipped: usize,
}

#[derive(Clone)]
pub struct MigrationUseCases {
    guest: Arc<dyn GuestSnapshotSource>,
    sink: Arc<dyn ImportSink>,
}

impl MigrationUseCases {
    pub fn new(guest: Arc<dyn GuestSnapshotSource>, sink: Arc<dyn ImportSink>) -> Self {
        Self { guest, sink }
    }

    /// One-shot transplant of a device's data into an account partition.
    ///
    /// Payment methods go first so subscriptions can be re-pointed through a
    /// transient local-id → remote-id map that dies with this call. Any
    /// error before the final clear leaves the device data intact; rerunning
    /// re-submits everything and converges through the source keys.
    #[instrument(skip(self))]
    pub async fn migrate(&self, device_id: Uuid, account_id: Uuid) -> AppResult<MigrationReport> {
        let snapshot = self.guest.snapshot(device_id).await?;
        if snapshot.is_empty() {
            return Ok(MigrationReport::default());
        }

        let mut id_map: HashMap<Uuid, Uuid> = HashMap::new();
        let mut report = MigrationReport::default();

        for method in &snapshot.payment_methods {
            let input = CreatePaymentMethodInput {
                name: method.name.clone(),
                kind: method.kind,
                last_four: method.last_four.clone(),
                expiry_date: method.expiry_date.clone(),
                is_default: method.is_default,
            };
            let imported = self
                .sink
                .import_payment_method(account_id, &input, &source_key(device_id, method.id))
                .await?;
            id_map.insert(method.id, imported.id);
            report.payment_methods_migrated += 1;
        }

        for sub in &snapshot.subscriptions {
            let Some(remote_method_id) = id_map.get(&sub.payment_method_id) else {
                warn!(
                    subscription = %sub.id,
                    payment_method = %sub.payment_method_id,
                    "skipping subscription with unresolvable payment method reference"
                );
                report.subscriptions_skipped += 1;
                continue;
            };
            let input = CreateSubscriptionInput {
                name: sub.name.clone(),
                description: sub.description.clone(),
                cost_cents: sub.cost_cents,
                currency: sub.currency.clone(),
                billing_cycle: sub.billing_cycle,
                next_billing_date: sub.next_billing_date,
                payment_method_id: *remote_method_id,
                category: sub.category.clone(),
                website: sub.website.clone(),
                notes: sub.notes.clone(),
                is_active: sub.is_active,
                max_slots: sub.max_slots,
            };
            self.sink
                .import_subscription(account_id, &input, &source_key(device_id, sub.id))
                .await?;
            report.subscriptions_migrated += 1;
        }

        self.guest.clear(device_id).await?;

        info!(
            device = %device_id,
            account = %account_id,
            payment_methods = report.payment_methods_migrated,
            subscriptions = report.subscriptions_migrated,
            skipped = report.subscriptions_skipped,
            "guest data migrated"
        );
        Ok(report)
    }
}

/// Stable per-row idempotency key: the same device row always maps to the
/// same key, whichever tab or retry submits it.
fn source_key(device_id: Uuid, local_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(device_id.as_bytes());
    hasher.update(local_id.as_bytes());
    hex::encode(hasher.finalize())
}
