//! Retention endpoints
//!
//! - `GET /pdf/tempfiles` lists expired artifacts
//! - `DELETE /pdf/tempfiles` removes them

use std::time::Duration;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

/// Optional override of the configured retention threshold
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdQuery {
    pub threshold_secs: Option<u64>,
}

impl ThresholdQuery {
    fn threshold(&self) -> Option<Duration> {
        self.threshold_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredFile {
    pub name: String,
    pub url: String,
    pub age_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted_count: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/tempfiles", get(list_expired).delete(delete_expired))
}

async fn list_expired(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> Result<Json<Vec<ExpiredFile>>> {
    let store = state.service().store();
    let files = state
        .retention()
        .list_expired(query.threshold())
        .await?
        .into_iter()
        .map(|expired| ExpiredFile {
            url: store.url_for_name(&expired.name),
            age_seconds: expired.age_seconds(),
            name: expired.name,
        })
        .collect();

    Ok(Json(files))
}

async fn delete_expired(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> Result<Json<DeleteResponse>> {
    let deleted_count = state.retention().delete_expired(query.threshold()).await?;
    Ok(Json(DeleteResponse { deleted_count }))
}
