use crate::config::Config;
use crate::db::{company_repository::CompanyRepository, user_repository::UserRepository};
use crate::services::smtp_mailer::Mailer;
use crate::utils::jwt::JwtKeys;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn UserRepository>,
    pub company_repo: Arc<dyn CompanyRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
    pub jwt_keys: Arc<JwtKeys>,
}
