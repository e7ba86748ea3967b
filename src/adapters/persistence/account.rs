use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::account::AccountProfile,
    use_cases::accounts::AccountRepo,
};

const SELECT_COLS: &str = "id, email, display_name, created_at";

#[async_trait]
impl AccountRepo for PostgresPersistence {
    async fn find_or_create_by_email(&self, email: &str) -> AppResult<AccountProfile> {
        if let Some(existing) = sqlx::query_as::<_, AccountProfile>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            SELECT_COLS
        ))
        .bind(email)
        .fetch_optional(self.pool())
        .await?
        {
            return Ok(existing);
        }

        let row = sqlx::query_as::<_, AccountProfile>(&format!(
            r#"INSERT INTO accounts (id, email)
               VALUES ($1, $2)
               ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
               RETURNING {}"#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<AccountProfile>> {
        let row = sqlx::query_as::<_, AccountProfile>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn set_display_name(&self, id: Uuid, display_name: &str) -> AppResult<AccountProfile> {
        let row = sqlx::query_as::<_, AccountProfile>(&format!(
            "UPDATE accounts SET display_name = $2 WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(id)
        .bind(display_name)
        .fetch_optional(self.pool())
        .await?
        .ok_or(AppError::NotFound)?;
        Ok(row)
    }
}
