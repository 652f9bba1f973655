//! Client for the external media host.
//!
//! Product images live on a third-party asset host. This client uploads
//! raw image bytes via multipart and deletes assets by their host-side id.

use reqwest::{
    Client, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
    multipart::{Form, Part},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::MediaConfig;

/// Errors that can occur talking to the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("Media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Media host returned an error status.
    #[error("Media host error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Media host response did not have the expected shape.
    #[error("Unexpected media host response: {0}")]
    Parse(String),
}

/// An asset the media host has accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// Public delivery URL.
    #[serde(rename = "secure_url")]
    pub url: String,
    /// Host-side identifier, needed for deletion.
    #[serde(rename = "public_id")]
    pub asset_id: String,
}

/// Client for the media host API.
#[derive(Clone)]
pub struct MediaClient {
    client: Client,
    api_url: String,
    upload_folder: String,
}

impl MediaClient {
    /// Create a new media client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.api_key.expose_secret()
        ))
        .map_err(|e| MediaError::Parse(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_folder: config.upload_folder.clone(),
        })
    }

    /// Upload one image and return its public URL and asset id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the host rejects the upload.
    pub async fn upload(&self, bytes: Vec<u8>, filename: String) -> Result<UploadedImage, MediaError> {
        let form = Form::new()
            .text("folder", self.upload_folder.clone())
            .part("file", Part::bytes(bytes).file_name(filename));

        let response = self
            .client
            .post(format!("{}/upload", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api { status, message });
        }

        let image: UploadedImage = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;
        Ok(image)
    }

    /// Delete an asset by its host-side id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the host rejects the deletion.
    pub async fn delete(&self, asset_id: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/assets/{asset_id}", self.api_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api { status, message });
        }

        Ok(())
    }
}
