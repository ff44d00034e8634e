#![allow(dead_code)]

//! Test doubles for the repository traits: no-op implementations for handler
//! tests that never touch one side of the state, and in-memory recording
//! implementations for tests that assert on what was written.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{
    company::{Company, CompanyMembershipSummary, Member, MemberRole, MemberWithUser},
    invitation::{Invitation, INVITATION_STATUS_ACCEPTED, INVITATION_STATUS_REVOKED},
    signup::SignupPayload,
    user::{Designation, PublicUser, User},
};

use super::{company_repository::CompanyRepository, user_repository::UserRepository};

pub struct NoopUserRepository;

#[async_trait]
impl UserRepository for NoopUserRepository {
    async fn create_user(
        &self,
        _payload: &SignupPayload,
        _password_hash: &str,
    ) -> Result<Uuid, sqlx::Error> {
        Ok(Uuid::new_v4())
    }

    async fn create_placeholder_user(
        &self,
        _name: &str,
        _email: &str,
    ) -> Result<Uuid, sqlx::Error> {
        Ok(Uuid::new_v4())
    }

    async fn claim_placeholder_user(
        &self,
        _user_id: Uuid,
        _name: &str,
        _password_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        Ok(1)
    }

    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }

    async fn find_user_by_id(&self, _user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(None)
    }

    async fn find_public_user_by_id(
        &self,
        _user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        Ok(None)
    }

    async fn list_users_by_company(
        &self,
        _company_id: Uuid,
    ) -> Result<Vec<PublicUser>, sqlx::Error> {
        Ok(vec![])
    }

    async fn set_company_link(
        &self,
        _user_id: Uuid,
        _company_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn update_designation(
        &self,
        _email: &str,
        _designation: Designation,
    ) -> Result<u64, sqlx::Error> {
        Ok(0)
    }

    async fn assign_manager(&self, _user_id: Uuid, _manager_id: Uuid) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

pub struct NoopCompanyRepository;

#[async_trait]
impl CompanyRepository for NoopCompanyRepository {
    async fn create_company(&self, name: &str, country: &str) -> Result<Company, sqlx::Error> {
        Ok(Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            country: country.to_string(),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    async fn find_company(&self, _company_id: Uuid) -> Result<Option<Company>, sqlx::Error> {
        Ok(None)
    }

    async fn add_member(
        &self,
        _company_id: Uuid,
        _user_id: Uuid,
        _role: MemberRole,
    ) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn set_member_role(
        &self,
        _company_id: Uuid,
        _user_id: Uuid,
        _role: MemberRole,
    ) -> Result<u64, sqlx::Error> {
        Ok(0)
    }

    async fn remove_member(&self, _company_id: Uuid, _user_id: Uuid) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn get_member(
        &self,
        _company_id: Uuid,
        _user_id: Uuid,
    ) -> Result<Option<Member>, sqlx::Error> {
        Ok(None)
    }

    async fn list_members(&self, _company_id: Uuid) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        Ok(vec![])
    }

    async fn count_owners(&self, _company_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(0)
    }

    async fn list_memberships_for_user(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<CompanyMembershipSummary>, sqlx::Error> {
        Ok(vec![])
    }

    async fn create_invitation(
        &self,
        _company_id: Uuid,
        _email: &str,
        _role: MemberRole,
        _token: &str,
        _expires_at: OffsetDateTime,
        _invited_by: Uuid,
    ) -> Result<Invitation, sqlx::Error> {
        Err(sqlx::Error::RowNotFound)
    }

    async fn find_invitation(
        &self,
        _invitation_id: Uuid,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        Ok(None)
    }

    async fn find_invitation_by_token(
        &self,
        _token: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        Ok(None)
    }

    async fn mark_invitation_accepted(&self, _invitation_id: Uuid) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn revoke_invitation(&self, _invitation_id: Uuid) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// In-memory user store that records mutations so tests can assert on them.
#[derive(Default)]
pub struct InMemoryUserRepository {
    pub users: Mutex<Vec<User>>,
    pub fail_create_user: bool,
    pub company_links: Mutex<Vec<(Uuid, Option<Uuid>)>>,
    pub manager_assignments: Mutex<Vec<(Uuid, Uuid)>>,
    pub designation_updates: Mutex<Vec<(String, Designation)>>,
}

impl InMemoryUserRepository {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub fn user_fixture(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".into(),
            email: email.to_string(),
            password_hash: "hashed".into(),
            designation: None,
            manager_id: None,
            company_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn public(user: &User) -> PublicUser {
        PublicUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            designation: user.designation,
            manager_id: user.manager_id,
            company_id: user.company_id,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(
        &self,
        payload: &SignupPayload,
        password_hash: &str,
    ) -> Result<Uuid, sqlx::Error> {
        if self.fail_create_user {
            return Err(sqlx::Error::RowNotFound);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: payload.name.clone(),
            email: payload.email.clone(),
            password_hash: password_hash.to_string(),
            designation: None,
            manager_id: None,
            company_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = user.id;
        self.users.lock().unwrap().push(user);
        Ok(id)
    }

    async fn create_placeholder_user(&self, name: &str, email: &str) -> Result<Uuid, sqlx::Error> {
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter().find(|u| u.email.eq_ignore_ascii_case(email)) {
            return Ok(existing.id);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            designation: None,
            manager_id: None,
            company_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let id = user.id;
        users.push(user);
        Ok(id)
    }

    async fn claim_placeholder_user(
        &self,
        user_id: Uuid,
        name: &str,
        password_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let mut rows = 0;
        for user in self
            .users
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|u| u.id == user_id && u.password_hash.is_empty())
        {
            user.name = name.to_string();
            user.password_hash = password_hash.to_string();
            rows += 1;
        }
        Ok(rows)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn find_public_user_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(Self::public))
    }

    async fn list_users_by_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<PublicUser>, sqlx::Error> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.company_id == Some(company_id))
            .map(Self::public)
            .collect())
    }

    async fn set_company_link(
        &self,
        user_id: Uuid,
        company_id: Option<Uuid>,
    ) -> Result<(), sqlx::Error> {
        if let Some(user) = self
            .users
            .lock()
            .unwrap()
            .iter_mut()
            .find(|u| u.id == user_id)
        {
            user.company_id = company_id;
        }
        self.company_links.lock().unwrap().push((user_id, company_id));
        Ok(())
    }

    async fn update_designation(
        &self,
        email: &str,
        designation: Designation,
    ) -> Result<u64, sqlx::Error> {
        let mut rows = 0;
        for user in self
            .users
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|u| u.email.eq_ignore_ascii_case(email))
        {
            user.designation = Some(designation);
            rows += 1;
        }
        self.designation_updates
            .lock()
            .unwrap()
            .push((email.to_string(), designation));
        Ok(rows)
    }

    async fn assign_manager(&self, user_id: Uuid, manager_id: Uuid) -> Result<(), sqlx::Error> {
        if let Some(user) = self
            .users
            .lock()
            .unwrap()
            .iter_mut()
            .find(|u| u.id == user_id)
        {
            user.manager_id = Some(manager_id);
        }
        self.manager_assignments
            .lock()
            .unwrap()
            .push((user_id, manager_id));
        Ok(())
    }
}

/// In-memory company store mirroring the Postgres semantics closely enough
/// for handler tests, including the upsert and the rows-affected contract.
#[derive(Default)]
pub struct InMemoryCompanyRepository {
    pub companies: Mutex<Vec<Company>>,
    pub members: Mutex<Vec<Member>>,
    pub invitations: Mutex<Vec<Invitation>>,
    pub fail_create_company: bool,
}

impl InMemoryCompanyRepository {
    pub fn invitation_fixture(
        company_id: Uuid,
        email: &str,
        role: MemberRole,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            company_id,
            email: email.to_string(),
            role,
            token: token.to_string(),
            status: crate::models::invitation::INVITATION_STATUS_PENDING.to_string(),
            expires_at,
            invited_by: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            accepted_at: None,
            revoked_at: None,
        }
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn create_company(&self, name: &str, country: &str) -> Result<Company, sqlx::Error> {
        if self.fail_create_company {
            return Err(sqlx::Error::Protocol("fail_create_company".into()));
        }
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            country: country.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.companies.lock().unwrap().push(company.clone());
        Ok(company)
    }

    async fn find_company(&self, company_id: Uuid) -> Result<Option<Company>, sqlx::Error> {
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == company_id)
            .cloned())
    }

    async fn add_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<(), sqlx::Error> {
        let mut members = self.members.lock().unwrap();
        if let Some(existing) = members
            .iter_mut()
            .find(|m| m.company_id == company_id && m.user_id == user_id)
        {
            existing.role = role;
        } else {
            members.push(Member {
                company_id,
                user_id,
                role,
                joined_at: OffsetDateTime::now_utc(),
            });
        }
        Ok(())
    }

    async fn set_member_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> Result<u64, sqlx::Error> {
        let mut rows = 0;
        for member in self
            .members
            .lock()
            .unwrap()
            .iter_mut()
            .filter(|m| m.company_id == company_id && m.user_id == user_id)
        {
            member.role = role;
            rows += 1;
        }
        Ok(rows)
    }

    async fn remove_member(&self, company_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
        self.members
            .lock()
            .unwrap()
            .retain(|m| !(m.company_id == company_id && m.user_id == user_id));
        Ok(())
    }

    async fn get_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Member>, sqlx::Error> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.company_id == company_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, company_id: Uuid) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.company_id == company_id)
            .map(|m| MemberWithUser {
                user_id: m.user_id,
                role: m.role,
                joined_at: m.joined_at,
                user: PublicUser {
                    id: m.user_id,
                    name: String::new(),
                    email: String::new(),
                    designation: None,
                    manager_id: None,
                    company_id: Some(m.company_id),
                },
            })
            .collect())
    }

    async fn count_owners(&self, company_id: Uuid) -> Result<i64, sqlx::Error> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.company_id == company_id && m.role == MemberRole::Owner)
            .count() as i64)
    }

    async fn list_memberships_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CompanyMembershipSummary>, sqlx::Error> {
        let companies = self.companies.lock().unwrap();
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                companies
                    .iter()
                    .find(|c| c.id == m.company_id)
                    .map(|c| CompanyMembershipSummary {
                        company: c.clone(),
                        role: m.role,
                    })
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
        let invitation = Invitation {
            id: Uuid::new_v4(),
            company_id,
            email: email.to_string(),
            role,
            token: token.to_string(),
            status: crate::models::invitation::INVITATION_STATUS_PENDING.to_string(),
            expires_at,
            invited_by,
            created_at: OffsetDateTime::now_utc(),
            accepted_at: None,
            revoked_at: None,
        };
        self.invitations.lock().unwrap().push(invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        Ok(self
            .invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == invitation_id)
            .cloned())
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        Ok(self
            .invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn mark_invitation_accepted(&self, invitation_id: Uuid) -> Result<(), sqlx::Error> {
        if let Some(invitation) = self
            .invitations
            .lock()
            .unwrap()
            .iter_mut()
            .find(|i| i.id == invitation_id)
        {
            invitation.status = INVITATION_STATUS_ACCEPTED.to_string();
            invitation.accepted_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn revoke_invitation(&self, invitation_id: Uuid) -> Result<(), sqlx::Error> {
        if let Some(invitation) = self
            .invitations
            .lock()
            .unwrap()
            .iter_mut()
            .find(|i| i.id == invitation_id)
        {
            invitation.status = INVITATION_STATUS_REVOKED.to_string();
            invitation.revoked_at = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }
}
