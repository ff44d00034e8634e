pub mod company_repository;
pub mod mock_db;
pub mod postgres_company_repository;
pub mod postgres_user_repository;
pub mod user_repository;
