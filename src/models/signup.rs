use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SignupPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub invite_token: Option<String>,
}
