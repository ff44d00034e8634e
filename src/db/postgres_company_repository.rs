use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{
    company::{Company, CompanyMembershipSummary, Member, MemberRole, MemberWithUser},
    invitation::{Invitation, INVITATION_STATUS_ACCEPTED, INVITATION_STATUS_REVOKED},
    user::{Designation, PublicUser},
};

use super::company_repository::CompanyRepository;

pub struct PostgresCompanyRepository {
    pub pool: PgPool,
}

#[derive(FromRow)]
struct MemberUserRow {
    user_id: Uuid,
    role: MemberRole,
    joined_at: OffsetDateTime,
    name: String,
    email: String,
    designation: Option<Designation>,
    manager_id: Option<Uuid>,
    company_id: Option<Uuid>,
}

#[derive(FromRow)]
struct MembershipRow {
    id: Uuid,
    name: String,
    country: String,
    created_at: OffsetDateTime,
    role: MemberRole,
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    async fn create_company(&self, name: &str, country: &str) -> Result<Company, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, country, created_at)
            VALUES ($1, $2, now())
            RETURNING id, name, country, created_at
            "#,
        )
        .bind(name)
        .bind(country)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, sqlx::Error> {
        sqlx::query_as::<_, Company>(
            "SELECT id, name, country, created_at FROM companies WHERE id = $1",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn add_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO members (company_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (company_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_member_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE members SET role = $3 WHERE company_id = $1 AND user_id = $2",
        )
        .bind(company_id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove_member(&self, company_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM members WHERE company_id = $1 AND user_id = $2")
            .bind(company_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Member>, sqlx::Error> {
        sqlx::query_as::<_, Member>(
            r#"
            SELECT company_id, user_id, role, joined_at
            FROM members
            WHERE company_id = $1 AND user_id = $2
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MemberUserRow>(
            r#"
            SELECT m.user_id,
                   m.role,
                   m.joined_at,
                   u.name,
                   u.email,
                   u.designation,
                   u.manager_id,
                   u.company_id
            FROM members m
            JOIN users u ON u.id = m.user_id
            WHERE m.company_id = $1
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| MemberWithUser {
                user_id: row.user_id,
                role: row.role,
                joined_at: row.joined_at,
                user: PublicUser {
                    id: row.user_id,
                    name: row.name,
                    email: row.email,
                    designation: row.designation,
                    manager_id: row.manager_id,
                    company_id: row.company_id,
                },
            })
            .collect())
    }

    async fn count_owners(&self, company_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM members WHERE company_id = $1 AND role = 'owner'",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CompanyMembershipSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT c.id,
                   c.name,
                   c.country,
                   c.created_at,
                   m.role
            FROM members m
            JOIN companies c ON c.id = m.company_id
            WHERE m.user_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CompanyMembershipSummary {
                company: Company {
                    id: row.id,
                    name: row.name,
                    country: row.country,
                    created_at: row.created_at,
                },
                role: row.role,
            })
            .collect())
    }

    async fn create_invitation(
        &self,
        company_id: Uuid,
        email: &str,
        role: MemberRole,
        token: &str,
        expires_at: OffsetDateTime,
        invited_by: Uuid,
    ) -> Result<Invitation, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations
                (company_id, email, role, token, status, expires_at, invited_by, created_at)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, now())
            RETURNING id, company_id, email, role, token, status, expires_at, invited_by,
                      created_at, accepted_at, revoked_at
            "#,
        )
        .bind(company_id)
        .bind(email)
        .bind(role)
        .bind(token)
        .bind(expires_at)
        .bind(invited_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, company_id, email, role, token, status, expires_at, invited_by,
                   created_at, accepted_at, revoked_at
            FROM invitations
            WHERE id = $1
            "#,
        )
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, company_id, email, role, token, status, expires_at, invited_by,
                   created_at, accepted_at, revoked_at
            FROM invitations
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE invitations SET status = $2, accepted_at = now() WHERE id = $1")
            .bind(invitation_id)
            .bind(INVITATION_STATUS_ACCEPTED)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_invitation(&self, invitation_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE invitations SET status = $2, revoked_at = now() WHERE id = $1")
            .bind(invitation_id)
            .bind(INVITATION_STATUS_REVOKED)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
