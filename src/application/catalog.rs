use tracing::info;

use crate::{
    api::ApiClient,
    domain::{AppError, Catalog, FormatCatalog, MediaInfo, VideoReference},
};

/// Looks up which encodings the service can produce for a video.
#[derive(Clone)]
pub struct FormatCatalogClient {
    api_client: ApiClient,
}

impl FormatCatalogClient {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub async fn discover(&self, reference: &VideoReference) -> Result<Catalog, AppError> {
        info!(url = %reference, "Discovering formats");
        let response = self.api_client.suggest_formats(reference.as_str()).await?;

        let formats = FormatCatalog::new(response.formats.video, response.formats.audio);

        let info = MediaInfo {
            title: response.info.title,
            author: response.info.author,
            duration_seconds: response.info.length,
            thumbnail_url: response.info.thumbnail_url,
        };

        Ok(Catalog {
            reference: reference.clone(),
            formats,
            info,
        })
    }
}
