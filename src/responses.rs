use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
}

impl JsonResponse {
    fn body(status: &str, success: bool, msg: &str) -> Self {
        JsonResponse {
            status: status.to_string(),
            success,
            message: msg.to_string(),
            code: None,
        }
    }

    pub fn success(msg: &str) -> impl IntoResponse {
        (StatusCode::OK, Json(Self::body("success", true, msg)))
    }

    pub fn bad_request(msg: &str) -> impl IntoResponse {
        (StatusCode::BAD_REQUEST, Json(Self::body("error", false, msg)))
    }

    pub fn unauthorized(msg: &str) -> impl IntoResponse {
        (StatusCode::UNAUTHORIZED, Json(Self::body("error", false, msg)))
    }

    pub fn forbidden(msg: &str) -> impl IntoResponse {
        (StatusCode::FORBIDDEN, Json(Self::body("error", false, msg)))
    }

    pub fn not_found(msg: &str) -> impl IntoResponse {
        (StatusCode::NOT_FOUND, Json(Self::body("error", false, msg)))
    }

    pub fn conflict(msg: &str) -> impl IntoResponse {
        (StatusCode::CONFLICT, Json(Self::body("error", false, msg)))
    }

    pub fn server_error(msg: &str) -> impl IntoResponse {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self::body("error", false, msg)),
        )
    }

    pub fn too_many_requests(msg: &str) -> impl IntoResponse {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(Self::body("error", false, msg)),
        )
    }
}
