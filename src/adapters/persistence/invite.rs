use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::{invite::InviteProfile, share::{ShareKind, ShareProfile}},
    use_cases::sharing::InviteRepo,
};

const SELECT_COLS: &str =
    "id, subscription_id, token_hash, expires_at, claimed_by_account_id, claimed_at, created_at";

const SHARE_COLS: &str =
    "id, subscription_id, kind, name, beneficiary_account_id, is_hidden, created_at";

#[async_trait]
impl InviteRepo for PostgresPersistence {
    async fn insert(
        &self,
        subscription_id: Uuid,
        token_hash: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<InviteProfile> {
        let row = sqlx::query_as::<_, InviteProfile>(&format!(
            r#"INSERT INTO share_invites (id, subscription_id, token_hash, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(subscription_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<InviteProfile>> {
        let row = sqlx::query_as::<_, InviteProfile>(&format!(
            "SELECT {} FROM share_invites WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> AppResult<Option<InviteProfile>> {
        let row = sqlx::query_as::<_, InviteProfile>(&format!(
            "SELECT {} FROM share_invites WHERE token_hash = $1",
            SELECT_COLS
        ))
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_pending_for_subscription(
        &self,
        subscription_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Vec<InviteProfile>> {
        let rows = sqlx::query_as::<_, InviteProfile>(&format!(
            r#"SELECT {} FROM share_invites
               WHERE subscription_id = $1
                 AND claimed_by_account_id IS NULL
                 AND expires_at >= $2
               ORDER BY created_at, id"#,
            SELECT_COLS
        ))
        .bind(subscription_id)
        .bind(now)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn claim(
        &self,
        token_hash: &str,
        account_id: Uuid,
        now: NaiveDateTime,
    ) -> AppResult<Option<ShareProfile>> {
        // One statement: the conditional claim feeds the share insert, so a
        // second claim of the same token updates zero rows and inserts
        // nothing. No window exists in which the invite is claimed but the
        // share is missing.
        let row = sqlx::query_as::<_, ShareProfile>(&format!(
            r#"WITH claimed AS (
                   UPDATE share_invites
                   SET claimed_by_account_id = $2, claimed_at = $3
                   WHERE token_hash = $1
                     AND claimed_by_account_id IS NULL
                     AND expires_at >= $3
                   RETURNING subscription_id
               )
               INSERT INTO subscription_shares (id, subscription_id, kind, beneficiary_account_id)
               SELECT $4, subscription_id, $5, $2 FROM claimed
               RETURNING {}"#,
            SHARE_COLS
        ))
        .bind(token_hash)
        .bind(account_id)
        .bind(now)
        .bind(Uuid::new_v4())
        .bind(ShareKind::User)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn delete_unclaimed(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM share_invites WHERE id = $1 AND claimed_by_account_id IS NULL",
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_subscription(&self, subscription_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM share_invites WHERE subscription_id = $1")
            .bind(subscription_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
