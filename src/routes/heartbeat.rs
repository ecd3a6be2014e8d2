//! Liveness endpoint

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub status: &'static str,
}

pub async fn heartbeat() -> Json<HeartbeatResponse> {
    Json(HeartbeatResponse { status: "ok" })
}
