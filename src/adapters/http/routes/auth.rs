use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::current_account_id},
    app_error::AppResult,
    application::jwt,
};

#[derive(Deserialize)]
struct RequestPayload {
    email: String,
}

#[derive(Deserialize)]
struct ConsumePayload {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenamePayload {
    display_name: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request))
        .route("/consume", post(consume))
        .route("/account", get(account).patch(rename))
}

async fn request(
    State(app_state): State<AppState>,
    Json(payload): Json<RequestPayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .auth_use_cases
        .request_login(&payload.email, app_state.config.magic_link_ttl_minutes)
        .await?;
    Ok((StatusCode::ACCEPTED, ()))
}

async fn consume(
    State(app_state): State<AppState>,
    Json(payload): Json<ConsumePayload>,
) -> AppResult<impl IntoResponse> {
    if let Some(account_id) = app_state
        .auth_use_cases
        .consume_login(&payload.token)
        .await?
    {
        let access = jwt::issue(
            account_id,
            &app_state.config.jwt_secret,
            app_state.config.access_token_ttl,
        )?;
        let refresh = jwt::issue(
            account_id,
            &app_state.config.jwt_secret,
            app_state.config.refresh_token_ttl,
        )?;

        let mut headers = HeaderMap::new();
        let access = Cookie::build(("access_token", access))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        let refresh = Cookie::build(("refresh_token", refresh))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .build();
        headers.append(
            "set-cookie",
            access
                .to_string()
                .parse()
                .expect("cookie is a valid header value"),
        );
        headers.append(
            "set-cookie",
            refresh
                .to_string()
                .parse()
                .expect("cookie is a valid header value"),
        );
        return Ok((StatusCode::OK, headers));
    }
    Ok((StatusCode::UNAUTHORIZED, HeaderMap::new()))
}

async fn account(
    State(app_state): State<AppState>,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let profile = app_state.auth_use_cases.get_account(account_id).await?;
    Ok(Json(profile))
}

async fn rename(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    Json(payload): Json<RenamePayload>,
) -> AppResult<impl IntoResponse> {
    let account_id = current_account_id(&app_state, &cookies)?;
    let profile = app_state
        .auth_use_cases
        .rename_account(account_id, &payload.display_name)
        .await?;
    Ok(Json(profile))
}
