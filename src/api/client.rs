use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::models::{ApiConfig, DownloadRequest, SuggestFormatsRequest, SuggestFormatsResponse};
use crate::utils::filename_from_content_disposition;

const SUGGEST_FORMATS_PATH: &str = "suggest_formats";
const DOWNLOAD_PATH: &str = "download";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Service returned {status}")]
    Rejected { status: String },

    #[error("Service unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Streaming body of a successful `/download` call.
pub struct DownloadResponse {
    /// Name parsed from `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes>>,
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                Client::new()
            });
        Self { config, http }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// POST a JSON body and fail on any non-success status.
    async fn post_json<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status_text(status),
            });
        }
        Ok(response)
    }

    /// Ask the service which encodings it can produce for `video_url`.
    pub async fn suggest_formats(&self, video_url: &str) -> Result<SuggestFormatsResponse> {
        let response = self
            .post_json(SUGGEST_FORMATS_PATH, &SuggestFormatsRequest { url: video_url })
            .await?;

        let body = response.bytes().await.map_err(ApiError::Unreachable)?;
        let parsed: SuggestFormatsResponse = serde_json::from_slice(&body)
            .map_err(|e| ApiError::MalformedResponse(format!("JSON decode error: {}", e)))?;

        info!(
            video = parsed.formats.video.len(),
            audio = parsed.formats.audio.len(),
            "Received format suggestions"
        );
        Ok(parsed)
    }

    /// Request the payload for one encoding.
    /// Returns the filename hint and the body stream.
    pub async fn download(&self, video_url: &str, quality: &str) -> Result<DownloadResponse> {
        let response = self
            .post_json(
                DOWNLOAD_PATH,
                &DownloadRequest {
                    url: video_url,
                    quality,
                },
            )
            .await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            // Titles are often non-ASCII, which `HeaderValue::to_str` refuses.
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .and_then(filename_from_content_disposition);
        let content_length = response.content_length();
        debug!(?filename, ?content_length, "Download response headers");

        let stream = response
            .bytes_stream()
            .map_err(ApiError::Unreachable)
            .boxed();

        Ok(DownloadResponse {
            filename,
            content_length,
            stream,
        })
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
