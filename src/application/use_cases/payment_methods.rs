use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators,
    domain::entities::{
        payment_method::{PaymentMethodKind, PaymentMethodProfile},
        session::Session,
    },
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodInput {
    pub name: String,
    pub kind: PaymentMethodKind,
    pub last_four: Option<String>,
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentMethodInput {
    pub name: Option<String>,
    pub kind: Option<PaymentMethodKind>,
    pub last_four: Option<String>,
    pub expiry_date: Option<String>,
    pub is_default: Option<bool>,
}

/// One partitioned collection of payment methods. Implemented by the
/// device-keyed guest store and by the multi-tenant Postgres store; the
/// default-flag rules live inside each implementation as one atomic unit
/// per mutation:
///   - the first method for an owner becomes default regardless of input,
///   - creating or updating with `is_default = true` demotes all siblings,
///   - deleting the default promotes the most recently created survivor.
#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn list(&self, owner_id: Uuid) -> AppResult<Vec<PaymentMethodProfile>>;
    async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Option<PaymentMethodProfile>>;
    async fn create(
        &self,
        owner_id: Uuid,
        input: &CreatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile>;
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        input: &UpdatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()>;
    async fn set_default(&self, owner_id: Uuid, id: Uuid) -> AppResult<PaymentMethodProfile>;
}

#[derive(Clone)]
pub struct PaymentMethodUseCases {
    guest: Arc<dyn PaymentMethodStore>,
    account: Arc<dyn PaymentMethodStore>,
}

impl PaymentMethodUseCases {
    pub fn new(guest: Arc<dyn PaymentMethodStore>, account: Arc<dyn PaymentMethodStore>) -> Self {
        Self { guest, account }
    }

    fn store(&self, session: &Session) -> &dyn PaymentMethodStore {
        match session {
            Session::Guest { .. } => self.guest.as_ref(),
            Session::Account { .. } => self.account.as_ref(),
        }
    }

    pub async fn list(&self, session: &Session) -> AppResult<Vec<PaymentMethodProfile>> {
        self.store(session).list(session.owner_id()).await
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        session: &Session,
        input: &CreatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        validate_create(input)?;
        self.store(session).create(session.owner_id(), input).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        input: &UpdatePaymentMethodInput,
    ) -> AppResult<PaymentMethodProfile> {
        validate_update(input)?;
        self.store(session)
            .update(session.owner_id(), id, input)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, session: &Session, id: Uuid) -> AppResult<()> {
        self.store(session).delete(session.owner_id(), id).await
    }

    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        session: &Session,
        id: Uuid,
    ) -> AppResult<PaymentMethodProfile> {
        self.store(session).set_default(session.owner_id(), id).await
    }
}

fn validate_create(input: &CreatePaymentMethodInput) -> AppResult<()> {
    if !validators::is_valid_label(&input.name) {
        return Err(AppError::InvalidInput("Invalid payment method name".into()));
    }
    if let Some(last_four) = &input.last_four {
        if !validators::is_valid_last_four(last_four) {
            return Err(AppError::InvalidInput(
                "lastFourDigits must be exactly four digits".into(),
            ));
        }
    }
    Ok(())
}

fn validate_update(input: &UpdatePaymentMethodInput) -> AppResult<()> {
    if let Some(name) = &input.name {
        if !validators::is_valid_label(name) {
            return Err(AppError::InvalidInput("Invalid payment method name".into()));
        }
    }
    if let Some(last_four) = &input.last_four {
        if !validators::is_valid_last_four(last_four) {
            return Err(AppError::InvalidInput(
                "lastFourDigits must be exactly four digits".into(),
            ));
        }
    }
    Ok(())
}
