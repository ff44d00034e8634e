use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    signup::SignupPayload,
    user::{Designation, PublicUser, User},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        payload: &SignupPayload,
        password_hash: &str,
    ) -> Result<Uuid, sqlx::Error>;
    /// Inserts a user with an unusable credential, for members created ahead
    /// of their invitation. Succeeds without touching anything if the email
    /// is already registered.
    async fn create_placeholder_user(&self, name: &str, email: &str)
        -> Result<Uuid, sqlx::Error>;
    /// Sets the name and credential on a placeholder row. Returns the number
    /// of rows changed; zero means the row already holds a credential.
    async fn claim_placeholder_user(
        &self,
        user_id: Uuid,
        name: &str,
        password_hash: &str,
    ) -> Result<u64, sqlx::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn find_public_user_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error>;
    async fn list_users_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<PublicUser>, sqlx::Error>;
    async fn set_company_link(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error>;
    /// Returns the number of rows changed so callers can distinguish a
    /// missing email from a successful update.
    async fn update_designation(
        &self,
        email: &str,
        designation: Designation,
    ) -> Result<u64, sqlx::Error>;
    async fn assign_manager(&self, user_id: Uuid, manager_id: Uuid) -> Result<(), sqlx::Error>;
}
