use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::{
    gifts::{dto::CreateGiftRequest, repo, repo_types::Gift},
    state::AppState,
};

type ApiError = (StatusCode, Json<Value>);

pub fn gift_routes() -> Router<AppState> {
    Router::new()
        .route("/gifts", get(list_gifts).post(create_gift))
        .route("/gifts/:id", get(get_gift))
}

#[instrument(skip(state))]
pub async fn list_gifts(State(state): State<AppState>) -> Result<Json<Vec<Gift>>, ApiError> {
    let gifts = repo::list_all(&state.db).await.map_err(internal)?;
    Ok(Json(gifts))
}

#[instrument(skip(state))]
pub async fn get_gift(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Gift>, ApiError> {
    match repo::find_by_id(&state.db, &id).await.map_err(internal)? {
        Some(gift) => Ok(Json(gift)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Gift not found" })),
        )),
    }
}

#[instrument(skip(state, body))]
pub async fn create_gift(
    State(state): State<AppState>,
    body: Result<Json<CreateGiftRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Gift>), ApiError> {
    let Json(body) = body.map_err(|rejection| {
        warn!(status = %rejection.status(), "rejected gift body");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": rejection.body_text() })),
        )
    })?;
    let gift = body.into_gift();
    let stored = repo::insert(&state.db, &gift).await.map_err(insert_failed)?;
    info!(gift_id = %stored.id, "gift created");
    Ok((StatusCode::CREATED, Json(stored)))
}

fn insert_failed(e: anyhow::Error) -> ApiError {
    if repo::is_unique_violation(&e) {
        warn!(error = %e, "gift id already taken");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Gift id already exists" })),
        );
    }
    internal(e)
}

fn internal(e: anyhow::Error) -> ApiError {
    error!(error = %e, "gift storage failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
}
