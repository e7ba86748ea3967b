use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::current_account_id},
    app_error::AppResult,
};

#[derive(Serialize)]
struct ItemsResponse<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
struct NamedSharePayload {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvitePayload {
    ttl_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedWithMeQuery {
    #[serde(default)]
    include_hidden: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions/{id}/shares",
            get(list_shares).post(add_named_share),
        )
        .route(
            "/subscriptions/{id}/invites",
            get(pending_invites).post(create_invite),
        )
        .route("/subscriptions/{id}/utilization", get(utilization))
        .route("/shares/{id}", axum::routing::delete(remove_share))
        .route("/shares/{id}/hide", post(toggle_hide))
        .route("/shared-with-me", get(shared_with_me))
        // One registration: the segment is a raw token for GET and an
        // invite id for DELETE, so the capture name must be shared.
        .route("/invites/{token}", get(invite_info).delete(revoke_invite))
        .route("/invites/{token}/claim", post(claim_invite))
}

async fn list_shares(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(subscription_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let shares = app_state
        .sharing_use_cases
        .get_subscription_shares(account_id, subscription_id)
        .await?;
    Ok(Json(ItemsResponse { items: shares }))
}

async fn add_named_share(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<NamedSharePayload>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let share = app_state
        .sharing_use_cases
        .add_named_share(account_id, subscription_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

async fn pending_invites(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(subscription_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let invites = app_state
        .sharing_use_cases
        .get_pending_invites(account_id, subscription_id)
        .await?;
    Ok(Json(ItemsResponse { items: invites }))
}

async fn create_invite(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(subscription_id): Path<Uuid>,
    Json(payload): Json<InvitePayload>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let created = app_state
        .sharing_use_cases
        .create_invite_link(account_id, subscription_id, payload.ttl_days.unwrap_or(7))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn utilization(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(subscription_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let report = app_state
        .sharing_use_cases
        .get_subscription_roi(account_id, subscription_id)
        .await?;
    Ok(Json(report))
}

async fn remove_share(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(share_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    app_state
        .sharing_use_cases
        .remove_share(account_id, share_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_hide(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(share_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let share = app_state
        .sharing_use_cases
        .toggle_hide_share(account_id, share_id)
        .await?;
    Ok(Json(share))
}

async fn shared_with_me(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Query(query): Query<SharedWithMeQuery>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let views = app_state
        .sharing_use_cases
        .get_shared_with_me(account_id, query.include_hidden)
        .await?;
    Ok(Json(ItemsResponse { items: views }))
}

/// Unauthenticated on purpose: the redacted preview is what an invitee sees
/// before deciding to sign in.
async fn invite_info(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let info = app_state.sharing_use_cases.get_invite_info(&token).await?;
    Ok(Json(info))
}

async fn claim_invite(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let share = app_state
        .sharing_use_cases
        .claim_invite(account_id, &token)
        .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

async fn revoke_invite(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(invite_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let invite_id = Uuid::parse_str(&invite_id)
        .map_err(|_| crate::app_error::AppError::InvalidInput("Invalid invite id".into()))?;
    app_state
        .sharing_use_cases
        .revoke_invite(account_id, invite_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
