use serde::{Deserialize, Serialize};
use url::Url;

/// Body of `POST /suggest_formats`
#[derive(Debug, Clone, Serialize)]
pub struct SuggestFormatsRequest<'a> {
    pub url: &'a str,
}

/// Body of `POST /download`
#[derive(Debug, Clone, Serialize)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
    pub quality: &'a str,
}

/// Response from the /suggest_formats endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggestFormatsResponse {
    pub formats: FormatsPayload,
    pub info: InfoPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatsPayload {
    #[serde(default)]
    pub video: Vec<String>,
    #[serde(default)]
    pub audio: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfoPayload {
    pub title: String,
    pub author: String,
    /// Duration in seconds
    pub length: u64,
    pub thumbnail_url: String,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    /// Prefix for saved files when the server does not name them.
    pub fallback_prefix: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://audiotuber.vercel.app/").expect("Invalid default base URL"),
            fallback_prefix: "krystalDownloader".to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
