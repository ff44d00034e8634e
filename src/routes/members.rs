use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use rand::{distr::Alphanumeric, Rng};
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    models::company::{MemberRole, RoleName},
    responses::JsonResponse,
    routes::auth::session::AuthSession,
    routes::helpers::{parse_user_id, require_company_manager},
    state::AppState,
};

const INVALID_INVITE_MESSAGE: &str = "Invalid or expired invite link";
const INVITATION_TTL_HOURS: i64 = 48;

#[derive(Debug, Deserialize)]
pub struct InviteMemberPayload {
    pub email: String,
    pub role: RoleName,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationPayload {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberPayload {
    #[serde(default)]
    pub member_user_id: Option<Uuid>,
    #[serde(default)]
    pub email: Option<String>,
}

/// POST /api/company/{company_id}/invitations.
pub async fn invite_member(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<InviteMemberPayload>,
) -> Response {
    let member = match require_company_manager(&state, &claims, company_id).await {
        Ok(member) => member,
        Err(response) => return response,
    };

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() {
        return JsonResponse::bad_request("Email is required").into_response();
    }

    let role = payload.role.normalize();
    if role == MemberRole::Owner {
        return JsonResponse::bad_request("Members cannot be invited as owner").into_response();
    }

    let company = match state.company_repo.find_company(company_id).await {
        Ok(Some(company)) => company,
        Ok(None) => return JsonResponse::not_found("Company not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load company {}: {:?}", company_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let expires_at = OffsetDateTime::now_utc() + Duration::hours(INVITATION_TTL_HOURS);

    let invitation = match state
        .company_repo
        .create_invitation(company_id, &email, role, &token, expires_at, member.user_id)
        .await
    {
        Ok(invitation) => invitation,
        Err(err) => {
            tracing::error!("failed to create invitation: {:?}", err);
            return JsonResponse::server_error("Could not create invitation").into_response();
        }
    };

    if let Err(err) = state
        .mailer
        .send_invitation_email(&email, &company.name, &token)
        .await
    {
        tracing::error!("failed to send invitation email: {}", err);
        // an unmailable token must not stay redeemable
        if let Err(revoke_err) = state.company_repo.revoke_invitation(invitation.id).await {
            tracing::error!("failed to revoke unmailed invitation: {:?}", revoke_err);
        }
        return JsonResponse::server_error("Failed to send invitation email").into_response();
    }

    Json(json!({
        "success": true,
        "invitation": invitation,
    }))
    .into_response()
}

/// POST /api/company/invitations/accept. The session user redeems a token
/// addressed to their email.
pub async fn accept_invitation(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<AcceptInvitationPayload>,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let token = payload.token.trim();
    if token.is_empty() {
        return JsonResponse::bad_request(INVALID_INVITE_MESSAGE).into_response();
    }

    let invitation = match state.company_repo.find_invitation_by_token(token).await {
        Ok(Some(invitation)) => invitation,
        Ok(None) => return JsonResponse::bad_request(INVALID_INVITE_MESSAGE).into_response(),
        Err(err) => {
            tracing::error!("failed to load invitation: {:?}", err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let now = OffsetDateTime::now_utc();
    if !invitation.is_usable(now) || !invitation.email.eq_ignore_ascii_case(&claims.email) {
        return JsonResponse::bad_request(INVALID_INVITE_MESSAGE).into_response();
    }

    let caller = match state.db.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return JsonResponse::unauthorized("User not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load user {}: {:?}", user_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };
    // A user carries at most one company link; it must stay in step with the
    // member rows.
    if caller.company_id.is_some() && caller.company_id != Some(invitation.company_id) {
        return JsonResponse::conflict(
            "Already a member of another company. Leave it before accepting this invitation.",
        )
        .into_response();
    }

    if let Err(err) = state
        .company_repo
        .add_member(invitation.company_id, user_id, invitation.role)
        .await
    {
        tracing::error!("failed to attach invited member: {:?}", err);
        return JsonResponse::server_error("Could not join company").into_response();
    }
    if let Err(err) = state
        .db
        .set_company_link(user_id, Some(invitation.company_id))
        .await
    {
        tracing::error!("failed to link invited member: {:?}", err);
        return JsonResponse::server_error("Could not join company").into_response();
    }
    if let Err(err) = state
        .company_repo
        .mark_invitation_accepted(invitation.id)
        .await
    {
        tracing::error!("failed to mark invitation accepted: {:?}", err);
    }

    Json(json!({
        "success": true,
        "company_id": invitation.company_id,
        "role": invitation.role,
    }))
    .into_response()
}

/// DELETE /api/company/{company_id}/invitations/{invitation_id}.
pub async fn revoke_invitation(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Path((company_id, invitation_id)): Path<(Uuid, Uuid)>,
) -> Response {
    if let Err(response) = require_company_manager(&state, &claims, company_id).await {
        return response;
    }

    let invitation = match state.company_repo.find_invitation(invitation_id).await {
        Ok(Some(invitation)) if invitation.company_id == company_id => invitation,
        Ok(_) => return JsonResponse::not_found("Invitation not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load invitation {}: {:?}", invitation_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if invitation.status != crate::models::invitation::INVITATION_STATUS_PENDING {
        return JsonResponse::bad_request("Invitation is no longer pending").into_response();
    }

    match state.company_repo.revoke_invitation(invitation.id).await {
        Ok(()) => JsonResponse::success("Invitation revoked").into_response(),
        Err(err) => {
            tracing::error!("failed to revoke invitation: {:?}", err);
            JsonResponse::server_error("Could not revoke invitation").into_response()
        }
    }
}

/// GET /api/company/{company_id}/members. Any member of the company may list.
pub async fn list_members(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Path(company_id): Path<Uuid>,
) -> Response {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.company_repo.get_member(company_id, user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return JsonResponse::forbidden("Not a member of this company").into_response();
        }
        Err(err) => {
            tracing::error!("failed to load membership for {}: {:?}", user_id, err);
            return JsonResponse::server_error("Database error").into_response();
        }
    }

    match state.company_repo.list_members(company_id).await {
        Ok(members) => Json(json!({
            "success": true,
            "members": members,
        }))
        .into_response(),
        Err(err) => {
            tracing::error!("failed to list members for {}: {:?}", company_id, err);
            JsonResponse::server_error("Database error").into_response()
        }
    }
}

/// DELETE /api/company/{company_id}/members. Targets a member by user id or
/// email. Members may always remove themselves; removing anyone else takes an
/// owner or manager role. The last owner can never be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<RemoveMemberPayload>,
) -> Response {
    let caller_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let self_removal = match (payload.member_user_id, payload.email.as_deref()) {
        (Some(id), _) => id == caller_id,
        (None, Some(email)) => email.trim().eq_ignore_ascii_case(&claims.email),
        (None, None) => {
            return JsonResponse::bad_request("member_user_id or email is required")
                .into_response();
        }
    };

    // The role check runs before any target lookup so the response does not
    // reveal which memberships exist.
    if !self_removal {
        if let Err(response) = require_company_manager(&state, &claims, company_id).await {
            return response;
        }
    }

    let target_id = match (payload.member_user_id, payload.email.as_deref()) {
        (Some(id), _) => id,
        (None, Some(email)) => {
            let email = email.trim().to_lowercase();
            match state.db.find_user_by_email(&email).await {
                Ok(Some(user)) => user.id,
                Ok(None) => return JsonResponse::not_found("Member not found").into_response(),
                Err(err) => {
                    tracing::error!("failed to resolve member email: {:?}", err);
                    return JsonResponse::server_error("Database error").into_response();
                }
            }
        }
        (None, None) => unreachable!("handled above"),
    };

    let target = match state.company_repo.get_member(company_id, target_id).await {
        Ok(Some(member)) => member,
        Ok(None) => return JsonResponse::not_found("Member not found").into_response(),
        Err(err) => {
            tracing::error!("failed to load target membership: {:?}", err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    if target.role == MemberRole::Owner {
        match state.company_repo.count_owners(company_id).await {
            Ok(count) if count <= 1 => {
                return JsonResponse::bad_request("Cannot remove the last owner").into_response();
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!("failed to count owners for {}: {:?}", company_id, err);
                return JsonResponse::server_error("Database error").into_response();
            }
        }
    }

    if let Err(err) = state.company_repo.remove_member(company_id, target_id).await {
        tracing::error!("failed to remove member: {:?}", err);
        return JsonResponse::server_error("Could not remove member").into_response();
    }
    if let Err(err) = state.db.set_company_link(target_id, None).await {
        tracing::error!("failed to clear company link: {:?}", err);
        return JsonResponse::server_error("Could not remove member").into_response();
    }

    JsonResponse::success("Member removed").into_response()
}
