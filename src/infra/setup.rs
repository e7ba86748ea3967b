use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        email::resend::ResendEmailSender, http::app_state::AppState,
        persistence::PostgresPersistence,
    },
    infra::{
        config::AppConfig, db::init_db, guest_store::RedisGuestStore,
        magic_links::MagicLinkStore,
    },
    use_cases::{
        accounts::{AccountRepo, AuthUseCases},
        migration::MigrationUseCases,
        payment_methods::PaymentMethodUseCases,
        sharing::{InviteRepo, ShareRepo, SharingUseCases},
        subscriptions::{SubscriptionDirectory, SubscriptionUseCases},
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = Arc::new(AppConfig::from_env());

    let pool = init_db(&config.database_url).await?;
    let postgres = Arc::new(PostgresPersistence::new(pool));
    let guest = Arc::new(RedisGuestStore::new(&config.redis_url, config.guest_ttl_days).await?);
    let magic_links = Arc::new(MagicLinkStore::new(&config.redis_url).await?);
    let email = Arc::new(ResendEmailSender::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    ));

    let accounts: Arc<dyn AccountRepo> = postgres.clone();
    let shares: Arc<dyn ShareRepo> = postgres.clone();
    let invites: Arc<dyn InviteRepo> = postgres.clone();
    let directory: Arc<dyn SubscriptionDirectory> = postgres.clone();

    let auth_use_cases = AuthUseCases::new(
        accounts.clone(),
        magic_links,
        email.clone(),
        config.app_origin.clone(),
    );
    let payment_method_use_cases =
        PaymentMethodUseCases::new(guest.clone(), postgres.clone());
    let subscription_use_cases = SubscriptionUseCases::new(
        guest.clone(),
        postgres.clone(),
        directory.clone(),
        shares.clone(),
        invites.clone(),
        accounts.clone(),
    );
    let migration_use_cases = MigrationUseCases::new(guest, postgres.clone());
    let sharing_use_cases = SharingUseCases::new(
        directory,
        shares,
        invites,
        accounts,
        email,
        config.app_origin.clone(),
    );

    Ok(AppState {
        config,
        auth_use_cases: Arc::new(auth_use_cases),
        payment_method_use_cases: Arc::new(payment_method_use_cases),
        subscription_use_cases: Arc::new(subscription_use_cases),
        migration_use_cases: Arc::new(migration_use_cases),
        sharing_use_cases: Arc::new(sharing_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "abosplit=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
