use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::AppServicesHandle;

pub async fn health(Extension(services): Extension<AppServicesHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "store": services.backend_name(),
        })),
    )
}
