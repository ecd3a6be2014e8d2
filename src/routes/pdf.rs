//! PDF processing endpoints
//!
//! Both endpoints take a multipart upload with the document in a `file`
//! field:
//! - `POST /pdf/images` renders every page
//! - `POST /pdf/figures` crops figures and captions and redacts their pages

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::artifacts::Artifact;
use crate::error::{AppError, Result};
use crate::geometry::CoordinateSpace;
use crate::pipeline::{ExtractRequest, ExtractResult, FigureRequest, RedactionRequest};
use crate::state::AppState;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Upload limit for a single document
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    /// Overrides the configured render DPI
    pub dpi: Option<f32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", post(convert_to_images))
        .route("/figures", post(extract_figures))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn convert_to_images(
    State(state): State<AppState>,
    Query(query): Query<ImagesQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Artifact>>> {
    let mut file = None;
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            file = Some(read_pdf(field).await?);
        }
    }

    let data = file.ok_or_else(|| AppError::Unprocessable("Missing field 'file'".to_string()))?;
    tracing::debug!(bytes = data.len(), dpi = ?query.dpi, "Converting PDF to images");

    let artifacts = state.service().convert_to_images(data, query.dpi).await?;
    Ok(Json(artifacts))
}

async fn extract_figures(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResult>> {
    let mut file = None;
    let mut figures: Option<Vec<FigureRequest>> = None;
    let mut redactions: Vec<RedactionRequest> = Vec::new();
    let mut space = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => file = Some(read_pdf(field).await?),
            "figures" => figures = Some(read_json(field, "figures").await?),
            "redactions" => redactions = read_json(field, "redactions").await?,
            "coordinateSpace" => space = Some(read_json(field, "coordinateSpace").await?),
            _ => tracing::debug!(field = %name, "Ignoring unknown multipart field"),
        }
    }

    let data = file.ok_or_else(|| AppError::Unprocessable("Missing field 'file'".to_string()))?;
    let figures =
        figures.ok_or_else(|| AppError::Unprocessable("Missing field 'figures'".to_string()))?;
    let space = space.unwrap_or(CoordinateSpace::Dpi(state.service().render_config().dpi));

    tracing::debug!(
        bytes = data.len(),
        figures = figures.len(),
        redactions = redactions.len(),
        "Extracting figures"
    );

    let result = state
        .service()
        .extract_figures(
            data,
            ExtractRequest {
                figures,
                redactions,
                space,
            },
        )
        .await?;

    Ok(Json(result))
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>> {
    multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {e}"))
    })
}

async fn read_pdf(field: Field<'_>) -> Result<Vec<u8>> {
    let content_type = field.content_type().unwrap_or_default();
    if content_type != PDF_CONTENT_TYPE {
        tracing::debug!(content_type = %content_type, "Rejected upload");
        return Err(AppError::BadRequest(
            "Invalid file type. Only PDF file allowed.".to_string(),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {e}")))?;
    Ok(data.to_vec())
}

async fn read_json<T: DeserializeOwned>(field: Field<'_>, name: &str) -> Result<T> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{name}': {e}")))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::Unprocessable(format!("Invalid field '{name}': {e}")))
}
