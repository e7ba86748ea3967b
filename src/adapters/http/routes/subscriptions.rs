use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::current_session},
    app_error::AppResult,
    use_cases::subscriptions::{CreateSubscriptionInput, UpdateSubscriptionInput},
};

#[derive(Serialize)]
struct ItemsResponse<T> {
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    active_only: bool,
    include_shared: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingQuery {
    window_days: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(list).post(create))
        .route("/subscriptions/summary", get(summary))
        .route("/subscriptions/upcoming", get(upcoming))
        .route(
            "/subscriptions/{id}",
            axum::routing::patch(update).delete(delete),
        )
}

async fn list(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let views = app_state
        .subscription_use_cases
        .list(
            &session,
            query.active_only,
            query.include_shared.unwrap_or(true),
        )
        .await?;
    Ok(Json(ItemsResponse { items: views }))
}

async fn create(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<CreateSubscriptionInput>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let subscription = app_state
        .subscription_use_cases
        .create(&session, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn update(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateSubscriptionInput>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let subscription = app_state
        .subscription_use_cases
        .update(&session, id, &payload)
        .await?;
    Ok(Json(subscription))
}

async fn delete(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    app_state
        .subscription_use_cases
        .delete(&session, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn summary(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let totals = app_state
        .subscription_use_cases
        .total_monthly_cost(&session)
        .await?;
    Ok(Json(ItemsResponse { items: totals }))
}

async fn upcoming(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
    Query(query): Query<UpcomingQuery>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let due = app_state
        .subscription_use_cases
        .upcoming_bills(&session, query.window_days.unwrap_or(7))
        .await?;
    Ok(Json(ItemsResponse { items: due }))
}
