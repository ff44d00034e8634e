pub mod admin;
pub mod auth;
pub mod company;
pub mod helpers;
pub mod members;
