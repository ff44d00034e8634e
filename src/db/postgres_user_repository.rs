use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    signup::SignupPayload,
    user::{Designation, PublicUser, User},
};

use super::user_repository::UserRepository;

pub struct PostgresUserRepository {
    pub pool: PgPool,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(
        &self,
        payload: &SignupPayload,
        password_hash: &str,
    ) -> Result<Uuid, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES ($1, $2, $3, now())
            RETURNING id
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn create_placeholder_user(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Uuid, sqlx::Error> {
        // Empty hash marks the credential unusable until the user signs up
        // through an invitation.
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES ($1, $2, '', now())
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((id,)) = inserted {
            return Ok(id);
        }

        let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn claim_placeholder_user(
        &self,
        user_id: Uuid,
        name: &str,
        password_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3
            WHERE id = $1 AND password_hash = ''
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, designation, manager_id, company_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, designation, manager_id, company_id, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_public_user_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, email, designation, manager_id, company_id
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_users_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, email, designation, manager_id, company_id
            FROM users
            WHERE company_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn set_company_link(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET company_id = $2 WHERE id = $1")
            .bind(user_id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_designation(
        &self,
        email: &str,
        designation: Designation,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET designation = $2 WHERE email = $1")
            .bind(email)
            .bind(designation)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn assign_manager(&self, user_id: Uuid, manager_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET manager_id = $2 WHERE id = $1")
            .bind(user_id)
            .bind(manager_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
