use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use ogsn_core::store::{GetMatch, RangeScan, ScanOrder, StrengthIndex};
use serde::Deserialize;

use crate::state::AppState;

use super::StatusApiError;

#[derive(Debug, Deserialize)]
pub struct ListGamesQuery {
    #[serde(default)]
    index: StrengthIndex,
    /// Defaults to the configured minimum median rating.
    min: Option<f64>,
    #[serde(default)]
    order: ScanOrder,
}

/// `GET /games`: matches whose chosen strength is at least `min`.
pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<ListGamesQuery>,
) -> Result<impl IntoResponse, StatusApiError> {
    let min = match query.min {
        Some(min) => min,
        None => state.settings.read().await.min_median_rating,
    };
    if !min.is_finite() {
        return Err(StatusApiError::BadRequest(format!("min must be finite, got {min}")));
    }

    let games = state
        .store
        .process(RangeScan {
            index: query.index,
            min,
            order: query.order,
        })
        .await?;
    Ok(Json(games))
}

/// `GET /games/{id}`
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusApiError> {
    let game = state
        .store
        .process(GetMatch { id })
        .await?
        .ok_or(StatusApiError::NotFound(id))?;
    Ok(Json(game))
}
