use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The service answered with a non-success status.
    ServiceRejected,
    /// No response reached us.
    Unreachable,
    /// The service answered OK but the body could not be decoded.
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("{}", remote_summary(*kind, detail))]
    Remote {
        kind: RemoteErrorKind,
        detail: String,
    },

    #[error("Could not save file: {0}")]
    Save(String),
}

fn remote_summary(kind: RemoteErrorKind, detail: &str) -> String {
    match kind {
        RemoteErrorKind::ServiceRejected => format!("Service rejected the request: {}", detail),
        RemoteErrorKind::Unreachable => format!("Service unreachable: {}", detail),
        RemoteErrorKind::MalformedResponse => format!("Unexpected response: {}", detail),
    }
}

impl AppError {
    pub fn remote(kind: RemoteErrorKind, detail: impl Into<String>) -> Self {
        Self::Remote {
            kind,
            detail: detail.into(),
        }
    }

    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Self::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// (title, message) pair shown to the user.
    pub fn notice(&self) -> (String, String) {
        match self {
            Self::InvalidUrl => (
                "Invalid URL".to_string(),
                "Please make sure you have pasted a valid YouTube video URL.".to_string(),
            ),
            Self::Remote { .. } => ("Request failed".to_string(), self.to_string()),
            Self::Save(reason) => ("Could not save file".to_string(), reason.clone()),
        }
    }
}
