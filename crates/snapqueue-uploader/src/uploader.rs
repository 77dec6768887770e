//! Uploadcare HTTP uploader.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use snapqueue_config::UploaderConfig;
use snapqueue_processor::{UploadError, UploadReceipt, Uploader};

use crate::api::{self, UploadResponse};

const FILE_NAME: &str = "photo.jpg";
const FILE_MIME: &str = "image/jpeg";

/// Uploads photos with a multipart POST to `{base_url}/base/`.
pub struct HttpUploader {
    public_key: String,
    endpoint: String,
    cdn_base: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(config: &UploaderConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;

        Ok(Self {
            public_key: config.public_key.clone(),
            endpoint: format!("{}/base/", config.base_url.trim_end_matches('/')),
            cdn_base: config.cdn_base.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    fn build_form(&self, payload: Bytes) -> Result<Form, UploadError> {
        let file = Part::bytes(payload.to_vec())
            .file_name(FILE_NAME)
            .mime_str(FILE_MIME)
            .map_err(|e| UploadError::Network(e.to_string()))?;

        Ok(Form::new()
            .text(api::PUB_KEY_FIELD, self.public_key.clone())
            .text(api::STORE_FIELD, "auto")
            .part(api::FILE_FIELD, file))
    }

    fn map_send_error(&self, e: reqwest::Error) -> UploadError {
        if e.is_timeout() {
            UploadError::Timeout(self.timeout_secs)
        } else {
            UploadError::Network(e.to_string())
        }
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/{}/", self.cdn_base, file_id)
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, payload: Bytes) -> Result<UploadReceipt, UploadError> {
        let size = payload.len();
        let form = self.build_form(payload)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: api::error_message(body),
            });
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        let file_id = parsed
            .file
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UploadError::InvalidResponse("missing 'file' field".to_string()))?;

        debug!("Uploaded {} bytes as {}", size, file_id);
        let url = self.file_url(&file_id);
        Ok(UploadReceipt::new(file_id, url))
    }
}

#[cfg(test)]
#[path = "uploader_tests.rs"]
mod tests;
