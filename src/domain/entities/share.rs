use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    /// Ledger entry only: a person named by the owner, no linked account.
    Named,
    /// A linked account that claimed an invite; grants read access.
    User,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareKind::Named => "named",
            ShareKind::User => "user",
        }
    }
}

impl std::fmt::Display for ShareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One occupied slot on a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareProfile {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub kind: ShareKind,
    pub name: Option<String>,
    pub beneficiary_account_id: Option<Uuid>,
    /// Beneficiary-controlled: hides the share from that beneficiary's own
    /// aggregate views without telling the owner anything.
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
}
