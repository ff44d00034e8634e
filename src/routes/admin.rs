use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    models::user::{Designation, User},
    responses::JsonResponse,
    routes::auth::session::AuthSession,
    routes::helpers::{parse_user_id, require_company_manager},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateDesignationPayload {
    pub email: String,
    pub designation: Designation,
}

#[derive(Debug, Deserialize)]
pub struct AssignManagerPayload {
    pub manager_id: Uuid,
    pub user_id: Uuid,
}

/// Caller's user record plus the company they manage. All admin operations
/// are scoped to that company.
async fn load_admin_context(
    state: &AppState,
    claims: &crate::routes::auth::claims::Claims,
) -> Result<(User, Uuid), Response> {
    let user_id = parse_user_id(claims)?;

    let caller = match state.db.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(JsonResponse::unauthorized("User not found").into_response()),
        Err(err) => {
            tracing::error!("failed to load user {}: {:?}", user_id, err);
            return Err(JsonResponse::server_error("Database error").into_response());
        }
    };

    let company_id = match caller.company_id {
        Some(id) => id,
        None => {
            return Err(JsonResponse::forbidden("Not a member of this company").into_response());
        }
    };

    require_company_manager(state, claims, company_id).await?;

    Ok((caller, company_id))
}

/// POST /api/admin/update-designation.
pub async fn update_designation(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<UpdateDesignationPayload>,
) -> Response {
    let (_, company_id) = match load_admin_context(&state, &claims).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return JsonResponse::bad_request("Email is required").into_response();
    }

    let target = match state.db.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::not_found("User not found").into_response(),
        Err(err) => {
            tracing::error!("failed to resolve user by email: {:?}", err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if target.company_id != Some(company_id) {
        return JsonResponse::forbidden("User is not in your company").into_response();
    }

    match state.db.update_designation(&email, payload.designation).await {
        Ok(0) => JsonResponse::not_found("User not found").into_response(),
        Ok(_) => JsonResponse::success("Designation updated").into_response(),
        Err(err) => {
            tracing::error!("failed to update designation: {:?}", err);
            JsonResponse::server_error("Could not update designation").into_response()
        }
    }
}

/// POST /api/admin/assign-manager.
pub async fn assign_manager(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<AssignManagerPayload>,
) -> Response {
    let (_, company_id) = match load_admin_context(&state, &claims).await {
        Ok(context) => context,
        Err(response) => return response,
    };

    if payload.manager_id == payload.user_id {
        return JsonResponse::bad_request("A user cannot manage themselves").into_response();
    }

    let manager = match state.db.find_user_by_id(payload.manager_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::not_found("Manager not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load manager {}: {:?}", payload.manager_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };
    let target = match state.db.find_user_by_id(payload.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::not_found("User not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load user {}: {:?}", payload.user_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if manager.company_id != Some(company_id) || target.company_id != Some(company_id) {
        return JsonResponse::forbidden("Both users must be in your company").into_response();
    }

    match state
        .db
        .assign_manager(payload.user_id, payload.manager_id)
        .await
    {
        Ok(()) => JsonResponse::success("Manager assigned").into_response(),
        Err(err) => {
            tracing::error!("failed to assign manager: {:?}", err);
            JsonResponse::server_error("Could not assign manager").into_response()
        }
    }
}
