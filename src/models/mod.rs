pub mod company;
pub mod invitation;
pub mod signup;
pub mod user;
