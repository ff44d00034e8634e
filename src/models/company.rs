use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::user::PublicUser;

/// Canonical membership role. The dashboard historically spoke two dialects
/// ("admin"/"member" on the invitation wire, "manager"/"employee" in the
/// designation column); [`RoleName::normalize`] folds both into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "member_role")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Manager,
    Employee,
}

/// Role as it arrives on the wire. Accepts the full historical vocabulary;
/// anything outside it is rejected by serde before reaching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Owner,
    Admin,
    Manager,
    Member,
    Employee,
}

impl RoleName {
    pub fn normalize(self) -> MemberRole {
        match self {
            RoleName::Owner => MemberRole::Owner,
            RoleName::Admin | RoleName::Manager => MemberRole::Manager,
            RoleName::Member | RoleName::Employee => MemberRole::Employee,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithUser {
    pub user_id: Uuid,
    pub role: MemberRole,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyMembershipSummary {
    pub company: Company,
    pub role: MemberRole,
}
