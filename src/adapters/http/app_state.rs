use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        accounts::AuthUseCases, migration::MigrationUseCases,
        payment_methods::PaymentMethodUseCases, sharing::SharingUseCases,
        subscriptions::SubscriptionUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub payment_method_use_cases: Arc<PaymentMethodUseCases>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub migration_use_cases: Arc<MigrationUseCases>,
    pub sharing_use_cases: Arc<SharingUseCases>,
}
