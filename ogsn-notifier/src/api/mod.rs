//! Read-only status API.
//!
//! # Endpoints
//!
//! - `GET /games?index=median|white|black&min=X&order=ascending|descending`
//!   – range scan over a strength index of the current snapshot
//! - `GET /games/{id}` – one tracked match
//! - `GET /clock`      – drift, latency and connection state

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use ogsn_core::store::StoreError;
use serde::Serialize;

use crate::state::AppState;

mod clock;
mod games;

/// Build the status API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games", get(games::list_games))
        .route("/games/{id}", get(games::get_game))
        .route("/clock", get(clock::show_clock))
}

// -- Shared error type --------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StatusApiError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("game {0} is not tracked")]
    NotFound(i64),

    #[error("invalid query: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for StatusApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            StatusApiError::Store(StoreError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            StatusApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StatusApiError::NotFound(_) => StatusCode::NOT_FOUND,
            StatusApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
