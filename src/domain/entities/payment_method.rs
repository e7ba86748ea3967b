use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    CreditCard,
    DebitCard,
    BankAccount,
    Paypal,
    Other,
}

impl PaymentMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::CreditCard => "credit_card",
            PaymentMethodKind::DebitCard => "debit_card",
            PaymentMethodKind::BankAccount => "bank_account",
            PaymentMethodKind::Paypal => "paypal",
            PaymentMethodKind::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentMethodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit_card" => Ok(PaymentMethodKind::CreditCard),
            "debit_card" => Ok(PaymentMethodKind::DebitCard),
            "bank_account" => Ok(PaymentMethodKind::BankAccount),
            "paypal" => Ok(PaymentMethodKind::Paypal),
            "other" => Ok(PaymentMethodKind::Other),
            _ => Err(format!("Invalid payment method kind: {}", s)),
        }
    }
}

/// A stored way of paying for subscriptions. `owner_id` is an account id in
/// the remote store and a device id in the guest store; the shape is
/// identical on both sides so migration can move rows without reshaping.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodProfile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub kind: PaymentMethodKind,
    pub last_four: Option<String>,
    pub expiry_date: Option<String>,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
