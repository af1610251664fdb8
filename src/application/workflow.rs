//! The fetch-then-download workflow.
//!
//! `transition` is a pure function from (state, event) to the next state plus
//! the effects it asks for. `WorkflowStateMachine` owns the current state,
//! forwards notices to a `Notifier` and hands remote calls back to the caller.

use tracing::{debug, warn};

use crate::domain::{AppError, Catalog, EncodingLabel, SavedFile, VideoReference};

/// Ticket attached to every issued remote call.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Validating {
        input: String,
    },
    Fetching {
        request: RequestId,
        reference: VideoReference,
    },
    CatalogReady(Catalog),
    Downloading {
        request: RequestId,
        catalog: Catalog,
        label: EncodingLabel,
    },
    /// Transient: reported, then replaced by `resume`.
    Error {
        reason: AppError,
        resume: Box<WorkflowState>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Fetching,
    CatalogReady,
    Downloading,
    Error,
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Validating { .. } => Phase::Validating,
            Self::Fetching { .. } => Phase::Fetching,
            Self::CatalogReady(_) => Phase::CatalogReady,
            Self::Downloading { .. } => Phase::Downloading,
            Self::Error { .. } => Phase::Error,
        }
    }

    /// A remote call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Fetching { .. } | Self::Downloading { .. })
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            Self::CatalogReady(catalog) | Self::Downloading { catalog, .. } => Some(catalog),
            _ => None,
        }
    }

    pub fn downloading_label(&self) -> Option<&EncodingLabel> {
        match self {
            Self::Downloading { label, .. } => Some(label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    SubmitUrl(String),
    CatalogLoaded {
        request: RequestId,
        result: Result<Catalog, AppError>,
    },
    SelectLabel(EncodingLabel),
    DownloadFinished {
        request: RequestId,
        result: Result<SavedFile, AppError>,
    },
    GoBack,
}

/// Remote work the caller must run and report back as an `Event`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Discover {
        request: RequestId,
        reference: VideoReference,
    },
    Retrieve {
        request: RequestId,
        reference: VideoReference,
        label: EncodingLabel,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(error: &AppError) -> Self {
        let (title, message) = error.notice();
        Self { title, message }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(Notice),
    Issue(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another remote call is in flight.
    Busy,
    /// Nothing to pick from outside `CatalogReady`.
    NoCatalog,
    /// The label is not part of the current catalog.
    NotOffered,
    /// The event has no meaning in the current state.
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Rejected(Rejection),
    /// A completion for a request the workflow no longer waits for.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: WorkflowState,
    pub effects: Vec<Effect>,
    pub disposition: Disposition,
}

impl Step {
    fn applied(state: WorkflowState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            disposition: Disposition::Applied,
        }
    }

    fn unchanged(state: WorkflowState, disposition: Disposition) -> Self {
        Self {
            state,
            effects: Vec::new(),
            disposition,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Compute the next state. `next_request` is the ticket to use if the step
/// issues a remote call.
pub fn transition(state: WorkflowState, event: Event, next_request: RequestId) -> Step {
    settle(apply(state, event, next_request), next_request)
}

fn apply(state: WorkflowState, event: Event, next_request: RequestId) -> Step {
    use WorkflowState as S;

    match (state, event) {
        (S::Idle | S::CatalogReady(_), Event::SubmitUrl(input)) => {
            Step::applied(S::Validating { input })
        }
        (state, Event::SubmitUrl(input)) => match VideoReference::parse(&input) {
            Ok(_) => Step::unchanged(state, Disposition::Rejected(Rejection::Busy)),
            // Report the bad URL, then resume the call in flight.
            Err(reason) => Step::unchanged(
                S::Error {
                    reason,
                    resume: Box::new(state),
                },
                Disposition::Rejected(Rejection::Busy),
            ),
        },

        (S::Fetching { request, reference }, Event::CatalogLoaded { request: done, result }) => {
            if done != request {
                return Step::unchanged(S::Fetching { request, reference }, Disposition::Stale);
            }
            match result {
                Ok(catalog) => Step::applied(S::CatalogReady(catalog)),
                Err(reason) => Step::applied(S::Error {
                    reason,
                    resume: Box::new(S::Idle),
                }),
            }
        }
        (state, Event::CatalogLoaded { .. }) => Step::unchanged(state, Disposition::Stale),

        (S::CatalogReady(catalog), Event::SelectLabel(label)) => {
            if !catalog.formats.contains(&label) {
                return Step::unchanged(
                    S::CatalogReady(catalog),
                    Disposition::Rejected(Rejection::NotOffered),
                );
            }
            let command = Command::Retrieve {
                request: next_request,
                reference: catalog.reference.clone(),
                label: label.clone(),
            };
            Step::applied(S::Downloading {
                request: next_request,
                catalog,
                label,
            })
            .with_effect(Effect::Issue(command))
        }
        (state @ (S::Downloading { .. } | S::Fetching { .. }), Event::SelectLabel(_)) => {
            Step::unchanged(state, Disposition::Rejected(Rejection::Busy))
        }
        (state, Event::SelectLabel(_)) => {
            Step::unchanged(state, Disposition::Rejected(Rejection::NoCatalog))
        }

        (
            S::Downloading {
                request,
                catalog,
                label,
            },
            Event::DownloadFinished { request: done, result },
        ) => {
            if done != request {
                return stale_download(
                    S::Downloading {
                        request,
                        catalog,
                        label,
                    },
                    &result,
                );
            }
            match result {
                Ok(saved) => Step::applied(S::Idle).with_effect(Effect::Notify(Notice::new(
                    "Download complete",
                    format!("Saved {}", saved.path.display()),
                ))),
                Err(reason) => Step::applied(S::Error {
                    reason,
                    resume: Box::new(S::CatalogReady(catalog)),
                }),
            }
        }
        (state, Event::DownloadFinished { result, .. }) => stale_download(state, &result),

        (S::CatalogReady(_) | S::Downloading { .. }, Event::GoBack) => Step::applied(S::Idle),
        (state @ S::Fetching { .. }, Event::GoBack) => {
            Step::unchanged(state, Disposition::Rejected(Rejection::Busy))
        }
        (state, Event::GoBack) => {
            Step::unchanged(state, Disposition::Rejected(Rejection::NotApplicable))
        }
    }
}

/// A retrieval the workflow stopped waiting for. Nothing changes, but a file
/// that still got saved is worth telling the user about.
fn stale_download(state: WorkflowState, result: &Result<SavedFile, AppError>) -> Step {
    let step = Step::unchanged(state, Disposition::Stale);
    match result {
        Ok(saved) => step.with_effect(Effect::Notify(Notice::new(
            "Download complete",
            format!("Earlier download saved {}", saved.path.display()),
        ))),
        Err(_) => step,
    }
}

/// Resolve `Validating` and `Error` until the workflow rests in a stable state.
fn settle(mut step: Step, next_request: RequestId) -> Step {
    loop {
        step.state = match step.state {
            WorkflowState::Validating { input } => match VideoReference::parse(&input) {
                Ok(reference) => {
                    step.effects.push(Effect::Issue(Command::Discover {
                        request: next_request,
                        reference: reference.clone(),
                    }));
                    WorkflowState::Fetching {
                        request: next_request,
                        reference,
                    }
                }
                Err(reason) => WorkflowState::Error {
                    reason,
                    resume: Box::new(WorkflowState::Idle),
                },
            },
            WorkflowState::Error { reason, resume } => {
                if matches!(reason, AppError::InvalidUrl) {
                    debug!("Rejected invalid URL");
                } else {
                    warn!(kind = ?reason.remote_kind(), error = %reason, "Workflow step failed");
                }
                step.effects.push(Effect::Notify(Notice::from(&reason)));
                *resume
            }
            stable => {
                step.state = stable;
                return step;
            }
        };
    }
}

/// Receives user-facing alerts.
pub trait Notifier {
    fn notify(&mut self, title: &str, message: &str);
}

/// What the caller has to do after `WorkflowStateMachine::handle`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub disposition: Disposition,
    pub command: Option<Command>,
}

pub struct WorkflowStateMachine<N> {
    state: WorkflowState,
    notifier: N,
    next_request: RequestId,
}

impl<N: Notifier> WorkflowStateMachine<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            state: WorkflowState::Idle,
            notifier,
            next_request: 1,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn handle(&mut self, event: Event) -> Dispatch {
        let from = self.state.phase();
        let current = std::mem::replace(&mut self.state, WorkflowState::Idle);
        let step = transition(current, event, self.next_request);
        self.state = step.state;

        let mut command = None;
        for effect in step.effects {
            match effect {
                Effect::Notify(notice) => self.notifier.notify(&notice.title, &notice.message),
                Effect::Issue(issued) => {
                    self.next_request += 1;
                    command = Some(issued);
                }
            }
        }

        debug!(
            ?from,
            to = ?self.state.phase(),
            disposition = ?step.disposition,
            "Workflow event handled"
        );

        Dispatch {
            disposition: step.disposition,
            command,
        }
    }
}
