use iced::Task;
use tracing::debug;

use crate::api::{ApiClient, ApiConfig};
use crate::application::workflow::Disposition;
use crate::application::{
    Event, Notifier, SaveTarget, Services, WorkflowState, WorkflowStateMachine,
};
use crate::domain::{AppError, VideoReference};
use crate::ui::{self, ToastBoard, UiMessage};

pub struct DownloadApp {
    workflow: WorkflowStateMachine<ToastBoard>,
    api_client: ApiClient,
    save_target: SaveTarget,
    services: Services,
    url_input: String,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        let api_client = ApiClient::new(ApiConfig::default());
        let save_target = SaveTarget::default();

        Self {
            workflow: WorkflowStateMachine::new(ToastBoard::default()),
            services: Services::new(api_client.clone(), save_target.saver()),
            api_client,
            save_target,
            url_input: String::new(),
        }
    }

    /// Switch where downloads are saved. A download already in flight keeps its saver.
    fn toggle_save_target(&mut self) {
        self.save_target = self.save_target.toggled();
        self.services = Services::new(self.api_client.clone(), self.save_target.saver());
        debug!(save_target = ?self.save_target, "Save target changed");
    }

    /// Feed `event` to the workflow and start whatever remote call it issues.
    fn dispatch(&mut self, event: Event) -> Task<Message> {
        let finishing_download = matches!(event, Event::DownloadFinished { .. });
        let dispatch = self.workflow.handle(event);

        if finishing_download
            && dispatch.disposition == Disposition::Applied
            && *self.workflow.state() == WorkflowState::Idle
        {
            self.url_input.clear();
        }

        match dispatch.command {
            Some(command) => {
                let services = self.services.clone();
                Task::perform(services.execute(command), Message::Workflow)
            }
            None => Task::none(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Ui(UiMessage),
    /// Completion of a remote call, or a user action already translated.
    Workflow(Event),
    /// Clipboard contents after pressing Paste
    Pasted(Option<String>),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::Ui(ui_msg) => match ui_msg {
            UiMessage::UrlChanged(url) => {
                app.url_input = url;
                Task::none()
            }
            UiMessage::PastePressed => iced::clipboard::read().map(Message::Pasted),
            UiMessage::FetchPressed => {
                let input = app.url_input.trim().to_string();
                app.dispatch(Event::SubmitUrl(input))
            }
            UiMessage::FormatPicked(label) => app.dispatch(Event::SelectLabel(label)),
            UiMessage::GoBackPressed => {
                app.url_input.clear();
                app.dispatch(Event::GoBack)
            }
            UiMessage::ToggleSaveTarget => {
                app.toggle_save_target();
                Task::none()
            }
            UiMessage::DismissToast => {
                app.workflow.notifier_mut().dismiss();
                Task::none()
            }
        },
        Message::Workflow(event) => app.dispatch(event),
        Message::Pasted(contents) => {
            match contents.as_deref().map(|text| VideoReference::parse(text.trim())) {
                Some(Ok(reference)) => app.url_input = reference.as_str().to_string(),
                _ => {
                    debug!("Clipboard did not hold a video URL");
                    let (title, message) = AppError::InvalidUrl.notice();
                    app.workflow.notifier_mut().notify(&title, &message);
                }
            }
            Task::none()
        }
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    ui::view(
        app.workflow.state(),
        &app.url_input,
        app.save_target,
        app.workflow.notifier().current(),
    )
    .map(Message::Ui)
}
