//! Media upload routes.
//!
//! Files are streamed out of the multipart body and pushed to the media
//! host concurrently. The request is all-or-nothing: one failed upload
//! fails the whole request, with no cleanup of the files that made it.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::state::AppState;

/// One uploaded asset, as returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub url: String,
    pub asset_id: String,
}

/// Upload one or more image files to the media host.
///
/// POST /api/upload
///
/// # Errors
///
/// Returns 400 when the body carries no files, 502 when any upload fails.
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(_authed): RequireAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ImageResponse>>)> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let filename = field
            .file_name()
            .map_or_else(|| "upload".to_string(), ToOwned::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        files.push((bytes.to_vec(), filename));
    }

    if files.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let media = state.media();
    let uploaded = try_join_all(
        files
            .into_iter()
            .map(|(bytes, filename)| media.upload(bytes, filename)),
    )
    .await?;

    let images = uploaded
        .into_iter()
        .map(|image| ImageResponse {
            url: image.url,
            asset_id: image.asset_id,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(images)))
}

/// Request to delete an asset from the media host.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    pub asset_id: String,
}

/// Delete an asset from the media host by its opaque id.
///
/// DELETE /api/upload (admin)
///
/// # Errors
///
/// Returns 502 when the host reports an error.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(payload): Json<DeleteImageRequest>,
) -> Result<Json<serde_json::Value>> {
    if payload.asset_id.trim().is_empty() {
        return Err(AppError::Validation("Asset id is required".to_string()));
    }

    state.media().delete(&payload.asset_id).await?;

    Ok(Json(json!({ "message": "Image deleted" })))
}
