use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::subscription::SubscriptionProfile,
    use_cases::subscriptions::{
        CreateSubscriptionInput, SubscriptionDirectory, SubscriptionStore,
        UpdateSubscriptionInput,
    },
};

const SELECT_COLS: &str = "id, owner_id, name, description, cost_cents, currency, billing_cycle, \
     next_billing_date, payment_method_id, category, website, notes, is_active, max_slots, \
     created_at, updated_at";

impl PostgresPersistence {
    /// There is deliberately no FK behind this: deleting a payment method
    /// must succeed with cleanup deferred, so the reference is only checked
    /// when a write names it.
    async fn payment_method_resolves(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payment_methods WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(self.pool())
        .await?;
        if exists {
            Ok(())
        } else {
            Err(AppError::InvalidReference(
                "paymentMethodId does not resolve for this owner".into(),
            ))
        }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresPersistence {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<SubscriptionProfile>> {
        let rows = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            "SELECT {} FROM subscriptions WHERE owner_id = $1 ORDER BY created_at, id",
            SELECT_COLS
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1 AND owner_id = $2",
            SELECT_COLS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        self.payment_method_resolves(owner_id, input.payment_method_id)
            .await?;

        let row = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            r#"INSERT INTO subscriptions
                   (id, owner_id, name, description, cost_cents, currency, billing_cycle,
                    next_billing_date, payment_method_id, category, website, notes,
                    is_active, max_slots)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
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
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if let Some(payment_method_id) = input.payment_method_id {
            self.payment_method_resolves(owner_id, payment_method_id)
                .await?;
        }

        let row = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            r#"UPDATE subscriptions SET
                   name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   cost_cents = COALESCE($5, cost_cents),
                   currency = COALESCE($6, currency),
                   billing_cycle = COALESCE($7, billing_cycle),
                   next_billing_date = COALESCE($8, next_billing_date),
                   payment_method_id = COALESCE($9, payment_method_id),
                   category = COALESCE($10, category),
                   website = COALESCE($11, website),
                   notes = COALESCE($12, notes),
                   is_active = COALESCE($13, is_active),
                   max_slots = COALESCE($14, max_slots),
                   updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.cost_cents)
        .bind(&input.currency)
        .bind(input.billing_cycle)
        .bind(input.next_billing_date)
        .bind(input.payment_method_id)
        .bind(&input.category)
        .bind(&input.website)
        .bind(&input.notes)
        .bind(input.is_active)
        .bind(input.max_slots)
        .fetch_optional(self.pool())
        .await?
        .ok_or(AppError::NotFound)?;
        Ok(row)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        // The facade purges shares and invites first; the schema-level
        // cascades only back it up.
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionDirectory for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query_as::<_, SubscriptionProfile>(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}
