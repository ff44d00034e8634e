use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::{
    models::company::{Member, MemberRole},
    responses::JsonResponse,
    routes::auth::claims::Claims,
    state::AppState,
};

pub fn parse_user_id(claims: &Claims) -> Result<Uuid, Response> {
    Uuid::parse_str(&claims.id)
        .map_err(|_| JsonResponse::unauthorized("Invalid user ID").into_response())
}

/// Loads the caller's member row for `company_id` and rejects callers whose
/// role is not owner or manager. Any signed-in member may read; mutations go
/// through this gate.
pub async fn require_company_manager(
    state: &AppState,
    claims: &Claims,
    company_id: Uuid,
) -> Result<Member, Response> {
    let user_id = parse_user_id(claims)?;

    let member = match state.company_repo.get_member(company_id, user_id).await {
        Ok(Some(member)) => member,
        Ok(None) => {
            return Err(
                JsonResponse::forbidden("Not a member of this company").into_response()
            );
        }
        Err(err) => {
            tracing::error!("failed to load membership for {}: {:?}", user_id, err);
            return Err(JsonResponse::server_error("Database error").into_response());
        }
    };

    if !matches!(member.role, MemberRole::Owner | MemberRole::Manager) {
        return Err(
            JsonResponse::forbidden("Owner or manager role required").into_response()
        );
    }

    Ok(member)
}
