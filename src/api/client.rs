use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ContentPayload, ContentView, ConversionFile, DeleteResponse};
use crate::util::mime_type;

/// Typed wrappers over the five remote operations of the conversion service.
///
/// Every method returns `AppResult`; transport failures, non-2xx rejections
/// and malformed payloads are all folded into `AppError` so callers need a
/// single failure branch.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            http,
            base_url: config.api_endpoint(""),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Multipart submission of one file under the `file` form field.
    pub async fn upload_file(&self, filename: &str, data: Bytes) -> AppResult<ConversionFile> {
        let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        info!(
            request_id = %request_id,
            filename = %filename,
            size = data.len(),
            "Uploading file"
        );

        let part = multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type(filename))
            .map_err(|e| AppError::invalid_file(format!("invalid mime type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/files/upload"))
            .multipart(form)
            .send()
            .await?;
        let file: ConversionFile = Self::handle(response).await?;

        info!(
            request_id = %request_id,
            file_id = %file.id,
            "Upload accepted by server"
        );
        Ok(file)
    }

    /// The authoritative file list, in server-supplied order.
    pub async fn list_files(&self) -> AppResult<Vec<ConversionFile>> {
        debug!("Fetching file list");
        let response = self.http.get(self.url("/files/list")).send().await?;
        Self::handle(response).await
    }

    pub async fn get_file(&self, file_id: &str) -> AppResult<ConversionFile> {
        debug!(file_id = %file_id, "Fetching file");
        let response = self
            .http
            .get(self.url(&format!("/files/{}", file_id)))
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn get_file_content(
        &self,
        file_id: &str,
        view: ContentView,
    ) -> AppResult<ContentPayload> {
        debug!(file_id = %file_id, view = %view, "Fetching file content");
        let response = self
            .http
            .get(self.url(&format!("/files/{}/content", file_id)))
            .query(&[("type", view.as_str())])
            .send()
            .await?;
        Self::handle(response).await
    }

    pub async fn delete_file(&self, file_id: &str) -> AppResult<DeleteResponse> {
        info!(file_id = %file_id, "Deleting file");
        let response = self
            .http
            .delete(self.url(&format!("/files/{}", file_id)))
            .send()
            .await?;
        Self::handle(response).await
    }

    /// Non-2xx responses become `Rejected` with the body's `detail` field or
    /// the status text; undecodable 2xx payloads become `MalformedResponse`.
    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            warn!(status = status.as_u16(), detail = %detail, "Request rejected by server");
            return Err(AppError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let payload = response.json::<T>().await?;
        Ok(payload)
    }
}
