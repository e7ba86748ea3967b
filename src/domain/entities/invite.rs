use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a token was not accepted. `Expired` is derived at read time from
/// `expires_at`; nothing sweeps invites in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteRejection {
    Unknown,
    AlreadyClaimed,
    Expired,
}

impl InviteRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteRejection::Unknown => "unknown",
            InviteRejection::AlreadyClaimed => "already_claimed",
            InviteRejection::Expired => "expired",
        }
    }
}

impl std::fmt::Display for InviteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single-use, time-limited token that converts into a `user` share when
/// claimed. Only the SHA-256 digest of the token is stored; the raw token
/// leaves the system exactly once, at mint time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InviteProfile {
    pub id: Uuid,
    pub subscription_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
    pub claimed_by_account_id: Option<Uuid>,
    pub claimed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl InviteProfile {
    pub fn is_claimed(&self) -> bool {
        self.claimed_by_account_id.is_some()
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at < now
    }

    /// Claimed wins over expired: a token claimed before its deadline stays
    /// claimed forever, however stale the row gets.
    pub fn rejection(&self, now: NaiveDateTime) -> Option<InviteRejection> {
        if self.is_claimed() {
            Some(InviteRejection::AlreadyClaimed)
        } else if self.is_expired(now) {
            Some(InviteRejection::Expired)
        } else {
            None
        }
    }
}
