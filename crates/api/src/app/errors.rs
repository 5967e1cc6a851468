use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use satchel_infra::BackpackError;

pub fn backpack_error_to_response(err: BackpackError) -> axum::response::Response {
    match err {
        e @ (BackpackError::CharacterNotFound(_) | BackpackError::ItemNotFound(_)) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        BackpackError::CapacityExceeded(e) => {
            json_error(StatusCode::BAD_REQUEST, "capacity_exceeded", e.to_string())
        }
        e @ BackpackError::Contention { .. } => {
            json_error(StatusCode::CONFLICT, "conflict", e.to_string())
        }
        BackpackError::Storage(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
