//! Builds an `AppState` wired entirely to in-memory ports, for HTTP-level
//! tests over the real router.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;

use crate::{
    adapters::http::app_state::AppState,
    infra::config::AppConfig,
    test_utils::{
        auth_mocks::{InMemoryAccountRepo, InMemoryMagicLinkStore, RecordingEmailSender},
        sharing_mocks::{InMemoryInviteRepo, InMemoryShareRepo},
        store_mocks::InMemoryStore,
    },
    use_cases::{
        accounts::{AccountRepo, AuthUseCases},
        migration::MigrationUseCases,
        payment_methods::PaymentMethodUseCases,
        sharing::{InviteRepo, ShareRepo, SharingUseCases},
        subscriptions::{SubscriptionDirectory, SubscriptionUseCases},
    },
};

/// The wired state plus handles to every in-memory port, so tests can seed
/// and inspect behind the HTTP surface.
pub struct TestAppState {
    pub state: AppState,
    pub guest: Arc<InMemoryStore>,
    pub remote: Arc<InMemoryStore>,
    pub shares: Arc<InMemoryShareRepo>,
    pub invites: Arc<InMemoryInviteRepo>,
    pub accounts: Arc<InMemoryAccountRepo>,
    pub magic_links: Arc<InMemoryMagicLinkStore>,
    pub email: Arc<RecordingEmailSender>,
}

#[derive(Default)]
pub struct TestAppStateBuilder;

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(self) -> TestAppState {
        let config = Arc::new(test_config());
        let guest = Arc::new(InMemoryStore::new());
        let remote = Arc::new(InMemoryStore::new());
        let shares = Arc::new(InMemoryShareRepo::new());
        let invites = Arc::new(InMemoryInviteRepo::new(shares.clone()));
        let accounts = Arc::new(InMemoryAccountRepo::new());
        let magic_links = Arc::new(InMemoryMagicLinkStore::new());
        let email = Arc::new(RecordingEmailSender::new());

        let accounts_dyn: Arc<dyn AccountRepo> = accounts.clone();
        let shares_dyn: Arc<dyn ShareRepo> = shares.clone();
        let invites_dyn: Arc<dyn InviteRepo> = invites.clone();
        let directory: Arc<dyn SubscriptionDirectory> = remote.clone();

        let state = AppState {
            config: config.clone(),
            auth_use_cases: Arc::new(AuthUseCases::new(
                accounts_dyn.clone(),
                magic_links.clone(),
                email.clone(),
                config.app_origin.clone(),
            )),
            payment_method_use_cases: Arc::new(PaymentMethodUseCases::new(
                guest.clone(),
                remote.clone(),
            )),
            subscription_use_cases: Arc::new(SubscriptionUseCases::new(
                guest.clone(),
                remote.clone(),
                directory.clone(),
                shares_dyn.clone(),
                invites_dyn.clone(),
                accounts_dyn.clone(),
            )),
            migration_use_cases: Arc::new(MigrationUseCases::new(guest.clone(), remote.clone())),
            sharing_use_cases: Arc::new(SharingUseCases::new(
                directory,
                shares_dyn,
                invites_dyn,
                accounts_dyn,
                email.clone(),
                config.app_origin.clone(),
            )),
        };

        TestAppState {
            state,
            guest,
            remote,
            shares,
            invites,
            accounts,
            magic_links,
            email,
        }
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SecretString::new("test-jwt-secret".into()),
        access_token_ttl: Duration::hours(1),
        refresh_token_ttl: Duration::days(30),
        resend_api_key: SecretString::new("re_test_key".into()),
        email_from: "noreply@abosplit.test".to_string(),
        app_origin: "https://app.abosplit.test".to_string(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        magic_link_ttl_minutes: 15,
        bind_addr: "127.0.0.1:0".parse().expect("valid test bind addr"),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        database_url: "postgres://unused-in-tests".to_string(),
        guest_ttl_days: 90,
    }
}
