use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::encoder::EncodeError;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrResponse {
    pub qr_code: String,
}

/// Joins every `data` value in query order; repeated keys are all encoded.
fn collect_data(pairs: Vec<(String, String)>) -> Option<String> {
    let data: String = pairs
        .into_iter()
        .filter(|(key, _)| key == "data")
        .map(|(_, value)| value)
        .collect();
    (!data.is_empty()).then_some(data)
}

/// Encodes the `data` query parameter as a PNG data URL.
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<QrResponse>, ApiError> {
    let data = collect_data(pairs).ok_or(ApiError::InputMissing)?;

    let encoder = Arc::clone(&state.encoder);
    let input = data.clone();
    let encoded = tokio::task::spawn_blocking(move || encoder.encode_data_url(&input))
        .await
        .map_err(|e| EncodeError::Task(e.to_string()))
        .and_then(std::convert::identity)
        .inspect_err(|e| error!(error = %e, "Error generating QR code"))?;

    info!(data = %data, "QR Code generated");
    Ok(Json(QrResponse { qr_code: encoded }))
}
