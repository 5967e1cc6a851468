use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use satchel_core::{CharacterId, ItemId};

use crate::app::{dto, errors, AppServicesHandle};

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(get_character))
        .route("/:id/backpacks", post(add_to_backpack))
}

fn parse_character_id(raw: &str) -> Result<CharacterId, axum::response::Response> {
    raw.parse::<CharacterId>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub async fn get_character(
    Extension(services): Extension<AppServicesHandle>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let character_id = match parse_character_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.profile(character_id).await {
        Ok(profile) => Json(dto::CharacterProfileResponse::from(profile)).into_response(),
        Err(e) => errors::backpack_error_to_response(e),
    }
}

pub async fn add_to_backpack(
    Extension(services): Extension<AppServicesHandle>,
    Path(id): Path<String>,
    body: Result<Json<Vec<ItemId>>, JsonRejection>,
) -> axum::response::Response {
    let character_id = match parse_character_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let Json(item_ids) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text());
        }
    };

    match services.add_items(character_id, &item_ids).await {
        Ok(added) => Json(added).into_response(),
        Err(e) => errors::backpack_error_to_response(e),
    }
}
