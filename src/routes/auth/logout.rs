use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration as TimeDuration;

use crate::{responses::JsonResponse, state::AppState};

pub async fn handle_logout(State(state): State<AppState>) -> impl IntoResponse {
    let expired_cookie = Cookie::build(("auth_token", ""))
        .path("/")
        .http_only(true)
        .secure(state.config.auth_cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(0));

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&expired_cookie.to_string()) {
        headers.insert(SET_COOKIE, value);
    }

    (StatusCode::OK, headers, JsonResponse::success("Logged out"))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::mock_db::{NoopCompanyRepository, NoopUserRepository};
    use crate::routes::auth::logout::handle_logout;
    use crate::services::smtp_mailer::MockMailer;
    use crate::state::test_support;

    #[tokio::test]
    async fn test_logout_clears_auth_cookie_and_returns_success() {
        let app = Router::new()
            .route("/logout", post(handle_logout))
            .with_state(test_support::app_state(
                Arc::new(NoopUserRepository),
                Arc::new(NoopCompanyRepository),
                Arc::new(MockMailer::default()),
            ));

        let res = app
            .oneshot(
                Request::post("/logout")
                    .header("Content-Type", "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);

        let set_cookie_header = res.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie_header.contains("auth_token="));
        assert!(set_cookie_header.contains("Max-Age=0"));
        assert!(set_cookie_header.contains("HttpOnly"));
        assert!(set_cookie_header.contains("SameSite=Lax"));

        let body_bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Logged out");
    }
}
