use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::OffsetDateTime;

use crate::utils::password::hash_password;
use crate::{
    models::signup::SignupPayload, responses::JsonResponse,
    routes::auth::session::issue_session_cookie, state::AppState,
};

const INVALID_INVITE_MESSAGE: &str = "Invalid or expired invite link";

pub async fn handle_signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Response {
    let repo = &state.db;
    let company_repo = &state.company_repo;

    let mut payload = payload;
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    if payload.name.is_empty() {
        return JsonResponse::bad_request("Name is required").into_response();
    }
    if payload.email.is_empty() {
        return JsonResponse::bad_request("Email is required").into_response();
    }

    let existing_user = match repo.find_user_by_email(&payload.email).await {
        Ok(user) => user,
        Err(err) => {
            tracing::error!("failed to check email: {:?}", err);
            return JsonResponse::server_error("Database error").into_response();
        }
    };

    let invite_token = payload
        .invite_token
        .as_ref()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    let mut invite_record = None;
    if let Some(token) = invite_token.as_ref() {
        match company_repo.find_invitation_by_token(token).await {
            Ok(Some(invite)) => {
                let now = OffsetDateTime::now_utc();
                let email_mismatch = !invite.email.eq_ignore_ascii_case(&payload.email);
                if !invite.is_usable(now) || email_mismatch {
                    return JsonResponse::bad_request(INVALID_INVITE_MESSAGE).into_response();
                }
                invite_record = Some(invite);
            }
            Ok(None) => {
                return JsonResponse::bad_request(INVALID_INVITE_MESSAGE).into_response();
            }
            Err(err) => {
                tracing::error!("failed to load invite: {:?}", err);
                return JsonResponse::server_error("Could not validate invitation").into_response();
            }
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(_) => return JsonResponse::server_error("Password hashing failed").into_response(),
    };

    let user_id = match (existing_user, invite_record.as_ref()) {
        // Members created ahead of signup hold a placeholder row with an
        // unusable credential. A matching invite lets this signup claim it.
        (Some(user), Some(invite)) if user.password_hash.trim().is_empty() => {
            if user.company_id.is_some() && user.company_id != Some(invite.company_id) {
                return JsonResponse::conflict("Already a member of another company")
                    .into_response();
            }
            match repo
                .claim_placeholder_user(user.id, &payload.name, &password_hash)
                .await
            {
                Ok(0) => {
                    return JsonResponse::conflict("User already registered").into_response();
                }
                Ok(_) => user.id,
                Err(e) => {
                    tracing::error!("failed to claim placeholder user: {:?}", e);
                    return JsonResponse::server_error("Could not create user").into_response();
                }
            }
        }
        (Some(_), _) => {
            return JsonResponse::conflict("User already registered").into_response();
        }
        (None, _) => match repo.create_user(&payload, &password_hash).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("failed to insert user: {:?}", e);
                return JsonResponse::server_error("Could not create user").into_response();
            }
        },
    };

    if let Some(invite) = invite_record {
        if let Err(err) = company_repo
            .add_member(invite.company_id, user_id, invite.role)
            .await
        {
            tracing::error!("failed to attach invited member: {:?}", err);
            return JsonResponse::server_error("Could not attach company membership")
                .into_response();
        }
        if let Err(err) = repo.set_company_link(user_id, Some(invite.company_id)).await {
            tracing::error!("failed to link user to company: {:?}", err);
            return JsonResponse::server_error("Could not attach company membership")
                .into_response();
        }
        if let Err(err) = company_repo.mark_invitation_accepted(invite.id).await {
            tracing::error!("failed to mark invite accepted: {:?}", err);
        }
    }

    let user = match repo.find_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::error!("user {} missing right after insert", user_id);
            return JsonResponse::server_error("Could not create user").into_response();
        }
        Err(e) => {
            tracing::error!("failed to reload user: {:?}", e);
            return JsonResponse::server_error("Could not create user").into_response();
        }
    };

    let headers = match issue_session_cookie(&user, false, &state) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::error!("JWT error: {:?}", e);
            return JsonResponse::server_error("Token generation failed").into_response();
        }
    };

    (
        StatusCode::OK,
        headers,
        Json(json!({
            "success": true,
            "user": user,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        db::{
            company_repository::CompanyRepository,
            mock_db::{InMemoryCompanyRepository, InMemoryUserRepository},
            user_repository::UserRepository,
        },
        models::{
            company::MemberRole,
            invitation::{INVITATION_STATUS_ACCEPTED, INVITATION_STATUS_REVOKED},
        },
        services::smtp_mailer::MockMailer,
        state::test_support,
    };

    fn test_payload() -> SignupPayload {
        SignupPayload {
            name: "Test User".into(),
            email: "test@example.com".into(),
            password: "password123".into(),
            invite_token: None,
        }
    }

    async fn run_signup(
        repo: Arc<dyn UserRepository>,
        company_repo: Arc<dyn CompanyRepository>,
        payload: SignupPayload,
    ) -> axum::response::Response {
        let app = axum::Router::new()
            .route("/", axum::routing::post(handle_signup))
            .with_state(test_support::app_state(
                repo,
                company_repo,
                Arc::new(MockMailer::default()),
            ));

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap();

        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_email_already_taken() {
        let repo = Arc::new(InMemoryUserRepository::with_users(vec![
            InMemoryUserRepository::user_fixture("test@example.com"),
        ]));
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let res = run_signup(repo, company_repo, test_payload()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_email_is_lowercased_before_duplicate_check() {
        let repo = Arc::new(InMemoryUserRepository::with_users(vec![
            InMemoryUserRepository::user_fixture("test@example.com"),
        ]));
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let mut payload = test_payload();
        payload.email = "  TEST@Example.COM ".into();

        let res = run_signup(repo, company_repo, payload).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_password_hash_fails() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let mut payload = test_payload();
        payload.password = "\0".to_string();

        let res = run_signup(repo, company_repo, payload).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_create_user_fails() {
        let repo = Arc::new(InMemoryUserRepository {
            fail_create_user: true,
            ..Default::default()
        });
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let res = run_signup(repo, company_repo, test_payload()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_successful_signup_sets_session_cookie() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let res = run_signup(repo.clone(), company_repo.clone(), test_payload()).await;

        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie should be set")
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("auth_token="));
        assert!(set_cookie.contains("HttpOnly"));

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["user"]["email"], "test@example.com");
        assert!(json["user"].get("password_hash").is_none());

        // no invite, so no membership was attached
        assert!(company_repo.members.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invite_join_attaches_membership() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        let invite = company_repo
            .create_invitation(
                Uuid::new_v4(),
                "test@example.com",
                MemberRole::Employee,
                "join-token",
                OffsetDateTime::now_utc() + Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let mut payload = test_payload();
        payload.invite_token = Some("join-token".into());

        let res = run_signup(repo.clone(), company_repo.clone(), payload).await;
        assert_eq!(res.status(), StatusCode::OK);

        let members = company_repo.members.lock().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].company_id, invite.company_id);
        assert_eq!(members[0].role, MemberRole::Employee);
        drop(members);

        let links = repo.company_links.lock().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].1, Some(invite.company_id));
        drop(links);

        let invitations = company_repo.invitations.lock().unwrap();
        assert_eq!(invitations[0].status, INVITATION_STATUS_ACCEPTED);
        assert!(invitations[0].accepted_at.is_some());
    }

    #[tokio::test]
    async fn test_invite_email_mismatch_rejected() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        company_repo
            .create_invitation(
                Uuid::new_v4(),
                "other@example.com",
                MemberRole::Employee,
                "mismatch-token",
                OffsetDateTime::now_utc() + Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let mut payload = test_payload();
        payload.invite_token = Some("mismatch-token".into());

        let res = run_signup(repo.clone(), company_repo.clone(), payload).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(company_repo.members.lock().unwrap().is_empty());
        assert!(repo.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_invite_rejected() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        company_repo
            .create_invitation(
                Uuid::new_v4(),
                "test@example.com",
                MemberRole::Employee,
                "expired-token",
                OffsetDateTime::now_utc() - Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let mut payload = test_payload();
        payload.invite_token = Some("expired-token".into());

        let res = run_signup(repo, company_repo.clone(), payload).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(company_repo.members.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoked_invite_rejected() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        let invite = company_repo
            .create_invitation(
                Uuid::new_v4(),
                "test@example.com",
                MemberRole::Employee,
                "revoked-token",
                OffsetDateTime::now_utc() + Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        company_repo.revoke_invitation(invite.id).await.unwrap();

        let mut payload = test_payload();
        payload.invite_token = Some("revoked-token".into());

        let res = run_signup(repo, company_repo.clone(), payload).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let invitations = company_repo.invitations.lock().unwrap();
        assert_eq!(invitations[0].status, INVITATION_STATUS_REVOKED);
    }

    #[tokio::test]
    async fn test_invite_signup_claims_placeholder_member() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let placeholder_id = repo
            .create_placeholder_user("Bob", "bob@example.com")
            .await
            .unwrap();
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        let invite = company_repo
            .create_invitation(
                Uuid::new_v4(),
                "bob@example.com",
                MemberRole::Employee,
                "claim-token",
                OffsetDateTime::now_utc() + Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let payload = SignupPayload {
            name: "Bob Real".into(),
            email: "bob@example.com".into(),
            password: "password123".into(),
            invite_token: Some("claim-token".into()),
        };

        let res = run_signup(repo.clone(), company_repo.clone(), payload).await;
        assert_eq!(res.status(), StatusCode::OK);

        // the placeholder row was claimed, not duplicated
        let users = repo.users.lock().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, placeholder_id);
        assert_eq!(users[0].name, "Bob Real");
        assert!(!users[0].password_hash.is_empty());
        assert_eq!(users[0].company_id, Some(invite.company_id));
        drop(users);

        let members = company_repo.members.lock().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, placeholder_id);
    }

    #[tokio::test]
    async fn test_placeholder_email_without_invite_conflicts() {
        let repo = Arc::new(InMemoryUserRepository::default());
        repo.create_placeholder_user("Bob", "bob@example.com")
            .await
            .unwrap();
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let mut payload = test_payload();
        payload.email = "bob@example.com".into();

        let res = run_signup(repo.clone(), company_repo, payload).await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        let users = repo.users.lock().unwrap();
        assert!(users[0].password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_linked_to_other_company_rejected() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let placeholder_id = repo
            .create_placeholder_user("Bob", "bob@example.com")
            .await
            .unwrap();
        repo.set_company_link(placeholder_id, Some(Uuid::new_v4()))
            .await
            .unwrap();
        let company_repo = Arc::new(InMemoryCompanyRepository::default());
        company_repo
            .create_invitation(
                Uuid::new_v4(),
                "bob@example.com",
                MemberRole::Employee,
                "poach-token",
                OffsetDateTime::now_utc() + Duration::hours(1),
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let mut payload = test_payload();
        payload.email = "bob@example.com".into();
        payload.invite_token = Some("poach-token".into());

        let res = run_signup(repo.clone(), company_repo, payload).await;

        assert_eq!(res.status(), StatusCode::CONFLICT);
        let users = repo.users.lock().unwrap();
        assert!(users[0].password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_invite_token_rejected() {
        let repo = Arc::new(InMemoryUserRepository::default());
        let company_repo = Arc::new(InMemoryCompanyRepository::default());

        let mut payload = test_payload();
        payload.invite_token = Some("no-such-token".into());

        let res = run_signup(repo, company_repo, payload).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
