//! JSON surface over the engine.
//!
//! Guard refusals ride out as HTTP 200 bodies; they are business
//! outcomes, not transport errors. Status codes are reserved for the
//! web layer's own problems: a missing or bad identity header (401),
//! ids that do not exist (404), and a store that cannot answer (500).
//!
//! Identity arrives in the `x-actor-id` header. A real deployment puts
//! an authenticating proxy in front of this and injects the header;
//! the core stays transport-agnostic either way.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use warren_logic::{ActorId, EntranceId};

use crate::engine::{EngineError, TransitionEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TransitionEngine>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/entrance/:entrance_id/use/", post(use_entrance))
        .route("/entrance/:entrance_id/info/", get(entrance_info))
        .route("/transitions/available/", get(available_transitions))
        .route("/healthz", get(|| async { "ok\n" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn actor_from_headers(headers: &HeaderMap) -> Result<ActorId, Response> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: "missing or invalid x-actor-id header".to_string(),
            }),
        )
            .into_response()
    };
    headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<ActorId>().ok())
        .ok_or_else(unauthorized)
}

fn engine_error(err: EngineError) -> Response {
    match err {
        EngineError::UnknownActor(_) | EngineError::UnknownEntrance(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        )
            .into_response(),
        EngineError::Unavailable(fault) => {
            error!(%fault, "request failed against the store");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "world unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn use_entrance(
    State(state): State<AppState>,
    Path(entrance_id): Path<EntranceId>,
    headers: HeaderMap,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match state.engine.attempt_transition(actor, entrance_id) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => engine_error(err),
    }
}

async fn available_transitions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match state.engine.available_transitions(actor) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => engine_error(err),
    }
}

async fn entrance_info(
    State(state): State<AppState>,
    Path(entrance_id): Path<EntranceId>,
) -> Response {
    match state.engine.entrance_info(entrance_id) {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(err) => engine_error(err),
    }
}
