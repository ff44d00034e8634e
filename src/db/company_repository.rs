use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{
    company::{Company, CompanyMembershipSummary, Member, MemberRole, MemberWithUser},
    invitation::Invitation,
};

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn create_company(&self, name: &str, country: &str) -> Result<Company, sqlx::Error>;
    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, sqlx::Error>;

    /// Upserts the member row; an existing membership gets its role replaced.
    async fn add_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<(), sqlx::Error>;
    /// Returns the number of member rows changed. Zero is not an error:
    /// role updates on unknown (company, user) pairs are a documented no-op.
    async fn set_member_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<u64, sqlx::Error>;
    async fn remove_member(&self, company_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error>;
    async fn get_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Member>, sqlx::Error>;
    async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberWithUser>, sqlx::Error>;
    async fn count_owners(&self, company_id: Uuid) -> Result<i64, sqlx::Error>;
    async fn list_memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CompanyMembershipSummary>, sqlx::Error>;

    async fn create_invitation(
        &self,
        company_id: Uuid,
        email: &str,
        role: MemberRole,
        token: &str,
        expires_at: OffsetDateTime,
        invited_by: Uuid,
    ) -> Result<Invitation, sqlx::Error>;
    async fn find_invitation(&self, invitation_id: Uuid)
        -> Result<Option<Invitation>, sqlx::Error>;
    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, sqlx::Error>;
    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> Result<(), sqlx::Error>;
    async fn revoke_invitation(&self, invitation_id: Uuid) -> Result<(), sqlx::Error>;
}
