use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::share::{ShareKind, ShareProfile},
    use_cases::sharing::ShareRepo,
};

const SELECT_COLS: &str =
    "id, subscription_id, kind, name, beneficiary_account_id, is_hidden, created_at";

#[async_trait]
impl ShareRepo for PostgresPersistence {
    async fn insert_named(&self, subscription_id: Uuid, name: &str) -> AppResult<ShareProfile> {
        let row = sqlx::query_as::<_, ShareProfile>(&format!(
            r#"INSERT INTO subscription_shares (id, subscription_id, kind, name)
               VALUES ($1, $2, $3, $4)
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(ShareKind::Named)
        .bind(name)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<ShareProfile>> {
        let row = sqlx::query_as::<_, ShareProfile>(&format!(
            "SELECT {} FROM subscription_shares WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> AppResult<Vec<ShareProfile>> {
        let rows = sqlx::query_as::<_, ShareProfile>(&format!(
            "SELECT {} FROM subscription_shares WHERE subscription_id = $1 ORDER BY created_at, id",
            SELECT_COLS
        ))
        .bind(subscription_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn count_for_subscription(&self, subscription_id: Uuid) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscription_shares WHERE subscription_id = $1")
                .bind(subscription_id)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    async fn list_for_beneficiary(&self, account_id: Uuid) -> AppResult<Vec<ShareProfile>> {
        let rows = sqlx::query_as::<_, ShareProfile>(&format!(
            r#"SELECT {} FROM subscription_shares
               WHERE kind = $1 AND beneficiary_account_id = $2
               ORDER BY created_at, id"#,
            SELECT_COLS
        ))
        .bind(ShareKind::User)
        .bind(account_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn set_hidden(&self, id: Uuid, hidden: bool) -> AppResult<ShareProfile> {
        let row = sqlx::query_as::<_, ShareProfile>(&format!(
            "UPDATE subscription_shares SET is_hidden = $2 WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(id)
        .bind(hidden)
        .fetch_optional(self.pool())
        .await?
        .ok_or(AppError::NotFound)?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM subscription_shares WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM subscription_shares WHERE subscription_id = $1")
            .bind(subscription_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
