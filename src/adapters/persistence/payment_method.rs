use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::payment_method::PaymentMethodProfile,
    use_cases::payment_methods::{
        CreatePaymentMethodInput, PaymentMethodStore, UpdatePaymentMethodInput,
    },
};

const SELECT_COLS: &str =
    "id, owner_id, name, kind, last_four, expiry_date, is_default, created_at, updated_at";

#[async_trait]
impl PaymentMethodStore for PostgresPersistence {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<PaymentMethodProfile>> {
        let rows = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            "SELECT {} FROM payment_methods WHERE owner_id = $1 ORDER BY created_at, id",
            SELECT_COLS
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<PaymentMethodProfile>> {
        let row = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            "SELECT {} FROM payment_methods WHERE id = $1 AND owner_id = $2",
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
        input: &CreatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let mut tx = self.pool().begin().await?;

        let siblings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_methods WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await?;
        let will_default = input.is_default || siblings == 0;
        if will_default {
            sqlx::query(
                "UPDATE payment_methods SET is_default = FALSE, updated_at = now()
                 WHERE owner_id = $1 AND is_default",
            )
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            r#"INSERT INTO payment_methods (id, owner_id, name, kind, last_four, expiry_date, is_default)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(input.name.trim())
        .bind(input.kind)
        .bind(&input.last_four)
        .bind(&input.expiry_date)
        .bind(will_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        let mut tx = self.pool().begin().await?;

        if input.is_default == Some(true) {
            sqlx::query(
                "UPDATE payment_methods SET is_default = FALSE, updated_at = now()
                 WHERE owner_id = $1 AND is_default AND id <> $2",
            )
            .bind(owner_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            r#"UPDATE payment_methods SET
                   name = COALESCE($3, name),
                   kind = COALESCE($4, kind),
                   last_four = COALESCE($5, last_four),
                   expiry_date = COALESCE($6, expiry_date),
                   is_default = COALESCE($7, is_default),
                   updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(input.kind)
        .bind(&input.last_four)
        .bind(&input.expiry_date)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        tx.commit().await?;
        Ok(row)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool().begin().await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM payment_methods WHERE id = $1 AND owner_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        if was_default {
            // Promote the most recently created survivor, if any.
            sqlx::query(
                r#"UPDATE payment_methods SET is_default = TRUE, updated_at = now()
                   WHERE id = (
                       SELECT id FROM payment_methods
                       WHERE owner_id = $1
                       ORDER BY created_at DESC, id DESC
                       LIMIT 1
                   )"#,
            )
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_default(&self, owner_id: Uuid, id: Uuid) -> AppResult<PaymentMethodProfile> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "UPDATE payment_methods SET is_default = FALSE, updated_at = now()
             WHERE owner_id = $1 AND is_default AND id <> $2",
        )
        .bind(owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // No row here means the target does not exist for this owner; the
        // dropped transaction rolls the demotion back.
        let row = sqlx::query_as::<_, PaymentMethodProfile>(&format!(
            r#"UPDATE payment_methods SET is_default = TRUE, updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        tx.commit().await?;
        Ok(row)
    }
}
