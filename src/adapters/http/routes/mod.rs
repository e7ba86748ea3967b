pub mod auth;
pub mod migration;
pub mod payment_methods;
pub mod sharing;
pub mod subscriptions;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(payment_methods::router())
        .merge(subscriptions::router())
        .merge(sharing::router())
        .merge(migration::router())
}
