use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// An authenticated account, created lazily on first login.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: NaiveDateTime,
}

impl AccountProfile {
    /// What sharing surfaces show as this account's name: the chosen display
    /// name, or the email local part until one is set.
    pub fn display_label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
                .to_string(),
        }
    }
}
