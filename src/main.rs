mod config;
mod db;
mod models;
mod responses;
mod routes;
mod services;
mod state;
pub mod utils;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::http::Method;
use axum::{
    http::HeaderName,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use config::Config;
use db::postgres_company_repository::PostgresCompanyRepository;
use db::postgres_user_repository::PostgresUserRepository;
use responses::JsonResponse;
use routes::{
    admin::{assign_manager, update_designation},
    auth::{handle_login, handle_logout, handle_me, handle_signup},
    company::{
        create_company, create_member, get_company, list_employees, update_employee_role,
    },
    members::{
        accept_invitation, invite_member, list_members, remove_member, revoke_invitation,
    },
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use utils::csrf::{get_csrf_token, validate_csrf};
use utils::jwt::JwtKeys;

use crate::db::{company_repository::CompanyRepository, user_repository::UserRepository};
use crate::services::smtp_mailer::SmtpMailer;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let rate_limit_ms: u64 = std::env::var("RATE_LIMITER_MILLISECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        // Default: 200ms/token (~5 req/sec)
        .unwrap_or(200);
    let rate_limit_burst: u32 = std::env::var("RATE_LIMITER_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(20);
    let global_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_ms)
            .burst_size(rate_limit_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    let rate_limit_auth_s: u64 = std::env::var("RATE_LIMITER_AUTH_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1);
    let rate_limit_auth_burst: u32 = std::env::var("RATE_LIMITER_AUTH_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10);
    // Stricter limiter for /api/auth/*
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(rate_limit_auth_s)
            .burst_size(rate_limit_auth_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    // Background task to cleanup old IPs
    let governor_limiter = global_governor_conf.limiter().clone();
    std::thread::spawn(move || {
        let interval = std::time::Duration::from_secs(60);
        loop {
            std::thread::sleep(interval);
            governor_limiter.retain_recent();
        }
    });

    let config = Arc::new(Config::from_env());

    let pg_pool = establish_connection(&config.database_url).await;
    let user_repo = Arc::new(PostgresUserRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn UserRepository>;
    let company_repo = Arc::new(PostgresCompanyRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn CompanyRepository>;

    let mailer = Arc::new(SmtpMailer::new().expect("Failed to initialize mailer"));
    let jwt_keys = Arc::new(JwtKeys::from_env().expect("JWT_SECRET must be set and strong"));

    let state = AppState {
        db: user_repo,
        company_repo,
        mailer,
        config: config.clone(),
        jwt_keys,
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true);

    let csrf_layer = ServiceBuilder::new().layer(axum::middleware::from_fn(validate_csrf));

    // Routes that require CSRF protection (unsafe HTTP methods)
    let csrf_protected_auth_routes = Router::new()
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .layer(csrf_layer.clone());

    // Safe methods skip the double-submit check
    let unprotected_auth_routes = Router::new()
        .route("/me", get(handle_me))
        .route("/csrf-token", get(get_csrf_token));

    let auth_routes = csrf_protected_auth_routes
        .merge(unprotected_auth_routes)
        .layer(GovernorLayer {
            config: auth_governor_conf.clone(),
        });

    let company_routes = Router::new()
        .route("/", get(get_company).post(create_company))
        .route("/members", post(create_member))
        .route(
            "/{company_id}/employees",
            get(list_employees).put(update_employee_role),
        )
        .route("/{company_id}/invitations", post(invite_member))
        .route(
            "/{company_id}/invitations/{invitation_id}",
            axum::routing::delete(revoke_invitation),
        )
        .route("/invitations/accept", post(accept_invitation))
        .route(
            "/{company_id}/members",
            get(list_members).delete(remove_member),
        )
        .layer(csrf_layer.clone());

    let admin_routes = Router::new()
        .route("/update-designation", post(update_designation))
        .route("/assign-manager", post(assign_manager))
        .layer(csrf_layer.clone());

    let app = Router::new()
        .route("/", get(root))
        .nest("/api/auth", auth_routes)
        .nest("/api/company", company_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: global_governor_conf.clone(),
        })
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));

    let listener = TcpListener::bind(addr).await.unwrap();
    println!("Running at http://{}", addr);
    axum::serve(listener, make_service).await.unwrap();
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Hello, StaffDesk!").into_response()
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> PgPool {
    let pool = PgPool::connect(database_url)
        .await
        .expect("Failed to connect to the database");

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .expect("Failed to verify database connection");

    info!("Successfully connected to the database");
    pool
}
