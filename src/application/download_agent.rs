use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, TryStreamExt};
use tracing::{info, warn};

use super::saver::FileSaver;
use crate::{
    api::{self, ApiClient},
    domain::{AppError, EncodingLabel, SavedFile, VideoReference},
    utils::fallback_filename,
};

/// Upper bound for the buffer reserved up front from `Content-Length`.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Fetches one encoding and hands the finished payload to the host saver.
#[derive(Clone)]
pub struct DownloadAgent {
    api_client: ApiClient,
    saver: Arc<dyn FileSaver>,
}

impl DownloadAgent {
    pub fn new(api_client: ApiClient, saver: Arc<dyn FileSaver>) -> Self {
        Self { api_client, saver }
    }

    pub async fn retrieve(
        &self,
        reference: &VideoReference,
        label: &EncodingLabel,
    ) -> Result<SavedFile, AppError> {
        info!(url = %reference, quality = %label, "Requesting download");
        let response = self
            .api_client
            .download(reference.as_str(), label.as_str())
            .await?;

        let suggested_name = response
            .filename
            .unwrap_or_else(|| fallback_filename(&self.api_client.config().fallback_prefix));

        let payload = buffer_payload(response.stream, response.content_length).await?;
        let byte_length = payload.len() as u64;

        let path = self
            .saver
            .save(payload, &suggested_name)
            .await
            .inspect_err(|e| warn!(name = %suggested_name, error = %e, "Save failed"))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(suggested_name);
        info!(path = %path.display(), bytes = byte_length, "Saved download");

        Ok(SavedFile {
            name,
            byte_length,
            path,
        })
    }
}

/// Read the whole body into memory.
async fn buffer_payload(
    mut stream: BoxStream<'static, api::Result<Bytes>>,
    content_length: Option<u64>,
) -> api::Result<Bytes> {
    let capacity = content_length.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
    let mut buffer = BytesMut::with_capacity(capacity);

    while let Some(chunk) = stream.try_next().await? {
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}
