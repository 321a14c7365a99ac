//! Route handlers for the decode service.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;
use super::AppState;
use crate::barcode::{self, BarcodeResult};
use crate::error::Error;
use crate::scans::SavePayload;

/// Body of `POST /decode`.
#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// The base64 encoded image.
    #[serde(rename = "imageBase64", default)]
    pub image_base64: Option<String>,
}

/// Successful answer of `POST /decode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    /// Recognized symbols, possibly empty.
    pub barcodes: Vec<BarcodeResult>,
}

/// Successful answer of `POST /save-json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Always `true`.
    pub ok: bool,
    /// Absolute path of the written file.
    pub path: String,
}

fn rejection(err: &JsonRejection) -> ApiError {
    Error::bad_request(err.body_text()).into()
}

/// `POST /decode`
pub async fn decode(
    State(state): State<AppState>,
    payload: Result<Json<DecodeRequest>, JsonRejection>,
) -> Result<Json<DecodeResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| rejection(&e))?;
    let image = request
        .image_base64
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::bad_request("imageBase64 required"))?;

    let engine = state.engine;
    let barcodes = tokio::task::spawn_blocking(move || barcode::decode_with(engine, &image))
        .await
        .map_err(|e| Error::internal(e.to_string()))??;

    Ok(Json(DecodeResponse { barcodes }))
}

/// `POST /save-json`
pub async fn save_json(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| rejection(&e))?;
    let container = SavePayload::from_value(body)?;

    let writer = state.scans.clone();
    let path = tokio::task::spawn_blocking(move || writer.save(&container))
        .await
        .map_err(|e| Error::internal(e.to_string()))??;

    Ok(Json(SaveResponse {
        ok: true,
        path: path.display().to_string(),
    }))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
