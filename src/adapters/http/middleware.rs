use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    domain::entities::session::Session,
};

pub const DEVICE_ID_HEADER: &str = "x-device-id";

/// Resolve the caller: a valid `access_token` cookie wins, otherwise the
/// `X-Device-Id` header names a guest partition. No session at all is a
/// credentials failure.
pub fn current_session(
    app_state: &AppState,
    cookies: &CookieJar,
    headers: &HeaderMap,
) -> AppResult<Session> {
    if let Some(cookie) = cookies.get("access_token") {
        let claims = jwt::verify(cookie.value(), &app_state.config.jwt_secret)?;
        let account_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidCredentials)?;
        return Ok(Session::Account { account_id });
    }
    if let Some(device_id) = device_id(headers)? {
        return Ok(Session::Guest { device_id });
    }
    Err(AppError::InvalidCredentials)
}

/// Account-only operations (sharing, migration) reject guest sessions.
pub fn current_account_id(app_state: &AppState, cookies: &CookieJar) -> AppResult<Uuid> {
    let cookie = cookies
        .get("access_token")
        .ok_or(AppError::InvalidCredentials)?;
    let claims = jwt::verify(cookie.value(), &app_state.config.jwt_secret)?;
    Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidCredentials)
}

pub fn device_id(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    match headers.get(DEVICE_ID_HEADER) {
        None => Ok(None),
        Some(value) => {
            let raw = value.to_str().map_err(|_| AppError::InvalidCredentials)?;
            let id = Uuid::parse_str(raw).map_err(|_| AppError::InvalidCredentials)?;
            Ok(Some(id))
        }
    }
}
