pub mod catalog;
pub mod download_agent;
pub mod saver;
pub mod workflow;

use std::sync::Arc;

pub use catalog::FormatCatalogClient;
pub use download_agent::DownloadAgent;
pub use saver::{DialogSaver, DirectorySaver, FileSaver, SaveError, SaveTarget};
pub use workflow::{Command, Event, Notifier, WorkflowState, WorkflowStateMachine};

use crate::api::{ApiClient, ApiError};
use crate::domain::{AppError, RemoteErrorKind};

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Rejected { status } => {
                AppError::remote(RemoteErrorKind::ServiceRejected, status)
            }
            ApiError::Unreachable(e) => AppError::remote(RemoteErrorKind::Unreachable, e.to_string()),
            ApiError::InvalidEndpoint(e) => {
                AppError::remote(RemoteErrorKind::Unreachable, format!("invalid endpoint: {}", e))
            }
            ApiError::MalformedResponse(detail) => {
                AppError::remote(RemoteErrorKind::MalformedResponse, detail)
            }
        }
    }
}

impl From<SaveError> for AppError {
    fn from(error: SaveError) -> Self {
        AppError::Save(error.to_string())
    }
}

/// Runs the remote calls the workflow asks for.
#[derive(Clone)]
pub struct Services {
    catalog: FormatCatalogClient,
    agent: DownloadAgent,
}

impl Services {
    pub fn new(api_client: ApiClient, saver: Arc<dyn FileSaver>) -> Self {
        Self {
            catalog: FormatCatalogClient::new(api_client.clone()),
            agent: DownloadAgent::new(api_client, saver),
        }
    }

    /// Execute `command` and turn its outcome into the event that completes it.
    pub async fn execute(self, command: Command) -> Event {
        match command {
            Command::Discover { request, reference } => Event::CatalogLoaded {
                request,
                result: self.catalog.discover(&reference).await,
            },
            Command::Retrieve {
                request,
                reference,
                label,
            } => Event::DownloadFinished {
                request,
                result: self.agent.retrieve(&reference, &label).await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;
    use crate::domain::EncodingLabel;
    use mockito::Matcher;
    use serde_json::json;
    use url::Url;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Vec<(String, String)>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, title: &str, message: &str) {
            self.notices.push((title.to_string(), message.to_string()));
        }
    }

    fn services(server: &mockito::ServerGuard, dir: &std::path::Path) -> Services {
        let api_client = ApiClient::new(ApiConfig {
            base_url: Url::parse(&format!("{}/", server.url())).unwrap(),
            ..ApiConfig::default()
        });
        Services::new(api_client, Arc::new(DirectorySaver::new(dir)))
    }

    #[tokio::test]
    async fn test_fetch_pick_and_save() {
        let mut server = mockito::Server::new_async().await;
        let url = "https://www.youtube.com/watch?v=abc123";
        let discover = server
            .mock("POST", "/suggest_formats")
            .match_body(Matcher::Json(json!({ "url": url })))
            .with_status(200)
            .with_body(
                json!({
                    "formats": { "video": ["720p", "1080p"], "audio": ["128kbps"] },
                    "info": { "title": "Demo", "author": "X", "length": 30, "thumbnail_url": "http://x/y.jpg" }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let download = server
            .mock("POST", "/download")
            .match_body(Matcher::Json(json!({ "url": url, "quality": "1080p" })))
            .with_status(200)
            .with_header("content-disposition", r#"attachment; filename="demo.mp4""#)
            .with_body("video-bytes")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, dir.path());
        let mut machine = WorkflowStateMachine::new(RecordingNotifier::default());

        let command = machine.handle(Event::SubmitUrl(url.into())).command.unwrap();
        assert!(machine.state().is_busy());
        let event = services.clone().execute(command).await;
        machine.handle(event);

        let catalog = machine.state().catalog().unwrap();
        assert_eq!(
            catalog.formats.video,
            vec![EncodingLabel::new("720p"), EncodingLabel::new("1080p")]
        );
        assert_eq!(catalog.formats.audio, vec![EncodingLabel::new("128kbps")]);
        assert_eq!(catalog.info.title, "Demo");

        let command = machine
            .handle(Event::SelectLabel(EncodingLabel::new("1080p")))
            .command
            .unwrap();
        let event = services.clone().execute(command).await;
        match &event {
            Event::DownloadFinished { result: Ok(saved), .. } => {
                assert_eq!(saved.name, "demo.mp4");
                assert_eq!(saved.byte_length, 11);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        machine.handle(event);

        discover.assert_async().await;
        download.assert_async().await;
        assert_eq!(machine.state(), &WorkflowState::Idle);
        assert_eq!(std::fs::read(dir.path().join("demo.mp4")).unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_network() {
        let mut server = mockito::Server::new_async().await;
        let discover = server
            .mock("POST", "/suggest_formats")
            .expect(0)
            .create_async()
            .await;
        let mut machine = WorkflowStateMachine::new(RecordingNotifier::default());

        let dispatch = machine.handle(Event::SubmitUrl("not a url".into()));

        assert!(dispatch.command.is_none());
        assert_eq!(machine.state(), &WorkflowState::Idle);
        assert_eq!(machine.notifier().notices.len(), 1);
        assert_eq!(machine.notifier().notices[0].0, "Invalid URL");
        discover.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_retrieval_keeps_catalog() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/suggest_formats")
            .with_status(200)
            .with_body(
                json!({
                    "formats": { "video": ["720p"], "audio": [] },
                    "info": { "title": "Demo", "author": "X", "length": 30, "thumbnail_url": "" }
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/download")
            .with_status(502)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, dir.path());
        let mut machine = WorkflowStateMachine::new(RecordingNotifier::default());

        let command = machine
            .handle(Event::SubmitUrl("https://youtu.be/abc".into()))
            .command
            .unwrap();
        machine.handle(services.clone().execute(command).await);
        let ready = machine.state().clone();

        let command = machine
            .handle(Event::SelectLabel(EncodingLabel::new("720p")))
            .command
            .unwrap();
        machine.handle(services.clone().execute(command).await);

        assert_eq!(machine.state(), &ready);
        let notices = &machine.notifier().notices;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].1.contains("502 Bad Gateway"), "{}", notices[0].1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_api_error_mapping() {
        let err: AppError = ApiError::MalformedResponse("bad json".into()).into();
        assert_eq!(err.remote_kind(), Some(RemoteErrorKind::MalformedResponse));

        let err: AppError = SaveError::Cancelled.into();
        assert_eq!(err, AppError::Save("Save cancelled".into()));
    }
}
