use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    adapters::http::{
        app_state::AppState,
        middleware::{current_account_id, device_id},
    },
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/migration", post(run))
}

/// Invoked by the client right after sign-in, and again on demand if the
/// first attempt failed; source keys make the re-run safe.
async fn run(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let device_id = device_id(&headers)?.ok_or(AppError::InvalidInput(
        "X-Device-Id header is required to migrate guest data".into(),
    ))?;
    let report = app_state
        .migration_use_cases
        .migrate(device_id, account_id)
        .await?;
    Ok(Json(report))
}
