use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use time::Duration as TimeDuration;

use crate::models::user::User;
use crate::routes::auth::claims::Claims;
use crate::state::AppState;
use crate::utils::jwt::{create_jwt, decode_jwt};

#[derive(Debug, PartialEq)]
pub struct AuthSession(pub Claims);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get("auth_token").ok_or(StatusCode::UNAUTHORIZED)?;

        let data = decode_jwt(
            token.value(),
            &state.jwt_keys,
            &state.config.jwt_issuer,
            &state.config.jwt_audience,
        )
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Ok(AuthSession(data.claims))
    }
}

/// Builds the `auth_token` cookie header for a fresh session.
pub fn issue_session_cookie(
    user: &User,
    remember: bool,
    state: &AppState,
) -> Result<HeaderMap, jsonwebtoken::errors::Error> {
    let expires_in = if remember {
        Duration::days(30)
    } else {
        Duration::days(7)
    };

    let claims = Claims {
        id: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        exp: (Utc::now() + expires_in).timestamp() as usize,
        iss: String::new(),
        aud: String::new(),
    };

    let token = create_jwt(
        claims,
        &state.jwt_keys,
        &state.config.jwt_issuer,
        &state.config.jwt_audience,
    )?;

    let cookie = Cookie::build(("auth_token", token))
        .http_only(true)
        .secure(state.config.auth_cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(TimeDuration::seconds(expires_in.num_seconds()))
        .build();

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        headers.insert(header::SET_COOKIE, value);
    }
    Ok(headers)
}
