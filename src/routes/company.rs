use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    models::company::{MemberRole, RoleName},
    responses::JsonResponse,
    routes::auth::session::AuthSession,
    routes::helpers::{parse_user_id, require_company_manager},
    state::AppState,
};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

fn validate_length(value: &str, field: &str) -> Result<(), Response> {
    let chars = value.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(JsonResponse::bad_request(&format!(
            "{} must be between {} and {} characters",
            field, NAME_MIN_CHARS, NAME_MAX_CHARS
        ))
        .into_response());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyPayload {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberPayload {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRolePayload {
    pub employee_id: Uuid,
    pub role: RoleName,
}

/// GET /api/company. The session user's company, `null` when unlinked.
pub async fn get_company(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let user = match state.db.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::unauthorized("User not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load user {}: {:?}", user_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let company = match user.company_id {
        Some(company_id) => match state.company_repo.find_company(company_id).await {
            Ok(company) => company,
            Err(err) => {
                tracing::error!("failed to load company {}: {:?}", company_id, err);
                return JsonResponse::server_error("Database error").into_response();
            }
        },
        None => None,
    };

    Json(json!({
        "success": true,
        "company": company,
    }))
    .into_response()
}

/// POST /api/company. Creates the company and promotes the caller to owner.
/// The three writes run in sequence without a wrapping transaction.
pub async fn create_company(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<CreateCompanyPayload>,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let name = payload.name.trim();
    let country = payload.country.trim();
    if let Err(response) = validate_length(name, "Company name") {
        return response;
    }
    if let Err(response) = validate_length(country, "Country") {
        return response;
    }

    let company = match state.company_repo.create_company(name, country).await {
        Ok(company) => company,
        Err(err) => {
            tracing::error!("failed to create company: {:?}", err);
            return JsonResponse::server_error("Could not create company").into_response();
        }
    };

    if let Err(err) = state.db.set_company_link(user_id, Some(company.id)).await {
        tracing::error!("failed to link company creator: {:?}", err);
        return JsonResponse::server_error("Could not create company").into_response();
    }

    if let Err(err) = state
        .company_repo
        .add_member(company.id, user_id, MemberRole::Owner)
        .await
    {
        tracing::error!("failed to attach owner membership: {:?}", err);
        return JsonResponse::server_error("Could not create company").into_response();
    }

    Json(json!({
        "success": true,
        "company": company,
    }))
    .into_response()
}

/// GET /api/company/{company_id}/employees. Requires a session, nothing more.
pub async fn list_employees(
    State(state): State<AppState>,
    AuthSession(_claims): AuthSession,
    Path(company_id): Path<Uuid>,
) -> Response {
    match state.db.list_users_by_company(company_id).await {
        Ok(employees) => Json(json!({
            "success": true,
            "employees": employees,
        }))
        .into_response(),
        Err(err) => {
            tracing::error!("failed to list employees for {}: {:?}", company_id, err);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}

/// POST /api/company/members. Inserts a user row with an unusable credential;
/// succeeds without touching anything when the email already exists.
pub async fn create_member(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<CreateMemberPayload>,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() {
        return JsonResponse::bad_request("Name is required").into_response();
    }
    if email.is_empty() {
        return JsonResponse::bad_request("Email is required").into_response();
    }

    let caller = match state.db.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::unauthorized("User not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load user {}: {:?}", user_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let company_id = match caller.company_id {
        Some(id) => id,
        None => {
            return JsonResponse::forbidden("Not a member of this company").into_response();
        }
    };

    if let Err(response) = require_company_manager(&state, &claims, company_id).await {
        return response;
    }

    match state.db.create_placeholder_user(name, &email).await {
        Ok(id) => Json(json!({
            "success": true,
            "user_id": id,
        }))
        .into_response(),
        Err(err) => {
            tracing::error!("failed to create member record: {:?}", err);
            JsonResponse::server_error("Could not create member").into_response()
        }
    }
}

/// PUT /api/company/{company_id}/employees. Updates matching member rows to
/// the normalized role. Unmatched ids leave the table untouched and still
/// return success.
pub async fn update_employee_role(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeeRolePayload>,
) -> Response {
    if let Err(response) = require_company_manager(&state, &claims, company_id).await {
        return response;
    }

    let role = payload.role.normalize();
    if role == MemberRole::Owner {
        return JsonResponse::bad_request("The owner role cannot be assigned here")
            .into_response();
    }

    // Demoting the only owner would orphan the company.
    match state
        .company_repo
        .get_member(company_id, payload.employee_id)
        .await
    {
        Ok(Some(member)) if member.role == MemberRole::Owner => {
            match state.company_repo.count_owners(company_id).await {
                Ok(count) if count <= 1 => {
                    return JsonResponse::bad_request("Cannot demote the last owner")
                        .into_response();
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!("failed to count owners for {}: {:?}", company_id, err);
                    return JsonResponse::server_error("Database error").into_response();
                }
            }
        }
        Ok(_) => {}
        Err(err) => {
            tracing::error!("failed to load target member: {:?}", err);
            return JsonResponse::server_error("Database error").into_response();
        }
    }

    match state
        .company_repo
        .set_member_role(company_id, payload.employee_id, role)
        .await
    {
        Ok(_rows) => JsonResponse::success("Role updated").into_response(),
        Err(err) => {
            tracing::error!("failed to update member role: {:?}", err);
            JsonResponse::server_error("Could not update role").into_response()
        }
    }
}
