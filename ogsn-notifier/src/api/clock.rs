use axum::{Json, extract::State, response::IntoResponse};
use ogsn_core::connection::ConnectionState;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct ClockResponse {
    /// Seconds the local clock is ahead of the server.
    drift: f64,
    /// Seconds of the last heartbeat round trip.
    latency: f64,
    state: ConnectionState,
}

/// `GET /clock`
pub async fn show_clock(State(state): State<AppState>) -> impl IntoResponse {
    let clock = *state.clock.borrow();
    Json(ClockResponse {
        drift: clock.drift,
        latency: clock.latency,
        state: *state.connection.borrow(),
    })
}
