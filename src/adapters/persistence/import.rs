use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::AppResult,
    domain::entities::{
        payment_method::PaymentMethodProfile, subscription::SubscriptionProfile,
    },
    use_cases::{
        migration::ImportSink,
        payment_methods::CreatePaymentMethodInput,
        subscriptions::CreateSubscriptionInput,
    },
};

const METHOD_COLS: &str =
    "id, owner_id, name, kind, last_four, expiry_date, is_default, created_at, updated_at";

const SUBSCRIPTION_COLS: &str = "id, owner_id, name, description, cost_cents, currency, \
     billing_cycle, next_billing_date, payment_method_id, category, website, notes, is_active, \
     max_slots, created_at, updated_at";

/// Migration writes. Same semantics as the regular creates, plus a
/// `source_key` upsert so a retried or concurrently duplicated migration
/// converges on one row per device row instead of inserting twins.
#[async_trait]
impl ImportSink for PostgresPersistence {
    async fn import_payment_method(
        &self,
        account_id: Uuid,
        input: &CreatePaymentMethodInput,
        source_key: &str,
    ) -> AppResult<PaymentMethodProfile> {
        let mut tx = self.pool().begin().await?;

        let siblings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_methods WHERE owner_id = $1")
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await?;
        let will_default = input.is_default || siblings == 0;
        if will_default {
            sqlx::query(
                "UPDATE payment_methods SET is_default = FALSE, updated_at = now()
                 WHERE owner_id = $1 AND is_default",
            )
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        }

        // On conflict the row is this device row's earlier import; restoring
        // its default flag undoes the demotion above.
        let row = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            r#"INSERT INTO payment_methods
                   (id, owner_id, name, kind, last_four, expiry_date, is_default, source_key)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (owner_id, source_key) WHERE source_key IS NOT NULL
               DO UPDATE SET is_default = EXCLUDED.is_default, updated_at = now()
               RETURNING {}"#,
            METHOD_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(input.name.trim())
        .bind(input.kind)
        .bind(&input.last_four)
        .bind(&input.expiry_date)
        .bind(will_default)
        .bind(source_key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn import_subscription(
        &self,
        account_id: Uuid,
        input: &CreateSubscriptionInput,
        source_key: &str,
    ) -> AppResult<SubscriptionProfile> {
        let row = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            r#"INSERT INTO subscriptions
                   (id, owner_id, name, description, cost_cents, currency, billing_cycle,
                    next_billing_date, payment_method_id, category, website, notes,
                    is_active, max_slots, source_key)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
               ON CONFLICT (owner_id, source_key) WHERE source_key IS NOT NULL
               DO UPDATE SET updated_at = now()
               RETURNING {}"#,
            SUBSCRIPTION_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.cost_cents)
        .bind(&input.currency)
        .bind(input.billing_cycle)
        .bind(input.next_billing_date)
        .bind(input.payment_method_id)
        .bind(input.category.trim())
        .bind(&input.website)
        .bind(&input.notes)
        .bind(input.is_active)
        .bind(input.max_slots)
        .bind(source_key)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }
}
