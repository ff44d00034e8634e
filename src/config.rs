use std::env;

pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub auth_cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Load .env file

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let frontend_origin = env::var("FRONTEND_ORIGIN").expect("FRONTEND_ORIGIN must be set");

        let jwt_issuer =
            env::var("JWT_ISSUER").unwrap_or_else(|_| "staffdesk-backend".to_string());
        let jwt_audience = env::var("JWT_AUDIENCE").unwrap_or_else(|_| "staffdesk".to_string());

        let auth_cookie_secure = env::var("AUTH_COOKIE_SECURE")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Config {
            database_url,
            frontend_origin,
            jwt_issuer,
            jwt_audience,
            auth_cookie_secure,
        }
    }
}
