use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::current_session},
    app_error::AppResult,
    domain::entities::payment_method::PaymentMethodProfile,
    use_cases::payment_methods::{CreatePaymentMethodInput, UpdatePaymentMethodInput},
};

#[derive(Serialize)]
struct ItemsResponse<T> {
    items: Vec<T>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment-methods", get(list).post(create))
        .route(
            "/payment-methods/{id}",
            axum::routing::patch(update).delete(delete),
        )
        .route("/payment-methods/{id}/default", post(set_default))
}

async fn list(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let methods: Vec<PaymentMethodProfile> =
        app_state.payment_method_use_cases.list(&session).await?;
    Ok(Json(ItemsResponse { items: methods }))
}

async fn create(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<CreatePaymentMethodInput>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let method = app_state
        .payment_method_use_cases
        .create(&session, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(method)))
}

async fn update(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePaymentMethodInput>,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let method = app_state
        .payment_method_use_cases
        .update(&session, id, &payload)
        .await?;
    Ok(Json(method))
}

async fn delete(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    app_state
        .payment_method_use_cases
        .delete(&session, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let session = current_session(&app_state, &cookies, &headers)?;
    let method = app_state
        .payment_method_use_cases
        .set_default(&session, id)
        .await?;
    Ok(Json(method))
}
