use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, to_value};

use crate::{
    responses::JsonResponse,
    routes::helpers::parse_user_id,
    state::AppState,
    utils::password::verify_password,
};

use super::session::{issue_session_cookie, AuthSession};

#[derive(Deserialize, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

pub async fn handle_login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();

    let user = match app_state.db.find_user_by_email(&email).await {
        Ok(Some(record)) => record,
        Ok(None) => return JsonResponse::unauthorized("Invalid credentials").into_response(),
        Err(e) => {
            tracing::error!("DB error during login: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    // Invited users get a placeholder row with no credential until they sign up.
    if user.password_hash.trim().is_empty() {
        return JsonResponse::unauthorized(
            "This account has no password sign-in. Complete signup with your invite link first.",
        )
        .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {
            let headers = match issue_session_cookie(&user, payload.remember, &app_state) {
                Ok(headers) => headers,
                Err(e) => {
                    tracing::error!("JWT error: {:?}", e);
                    return JsonResponse::server_error("Token generation failed").into_response();
                }
            };

            let user_json = match to_value(&user) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!("user serialization failed: {:?}", e);
                    return JsonResponse::server_error("Internal error").into_response();
                }
            };

            (
                StatusCode::OK,
                headers,
                Json(json!({
                    "success": true,
                    "user": user_json,
                })),
            )
                .into_response()
        }
        Ok(false) => JsonResponse::unauthorized("Invalid credentials").into_response(),
        Err(e) => {
            tracing::error!("password verification error: {:?}", e);
            return JsonResponse::server_error("Internal error").into_response();
        }
    }
}

pub async fn handle_me(
    State(app_state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let user = match app_state.db.find_public_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::unauthorized("User not found").into_response(),
        Err(e) => {
            tracing::error!("DB error in handle_me: {:?}", e);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let memberships = match app_state
        .company_repo
        .list_memberships_for_user(user.id)
        .await
    {
        Ok(data) => data,
        Err(err) => {
            tracing::error!(
                "failed to load company memberships for user {}: {:?}",
                user.id,
                err
            );
            return JsonResponse::server_error("Failed to load company context").into_response();
        }
    };

    Json(json!({
        "success": true,
        "user": user,
        "memberships": memberships,
    }))
    .into_response()
}
