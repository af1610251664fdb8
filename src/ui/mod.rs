use iced::{
    widget::{button, column, container, row, text, text_input, Column, Row, Space},
    Element, Length,
};

use crate::application::workflow::{Notice, Notifier, WorkflowState};
use crate::application::SaveTarget;
use crate::domain::{Catalog, EncodingLabel};

/// Characters of the title shown next to the format buttons.
const TITLE_PREVIEW_CHARS: usize = 34;

/// Single-slot toast: a new notice replaces the one on screen.
#[derive(Debug, Default)]
pub struct ToastBoard {
    current: Option<Notice>,
}

impl ToastBoard {
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

impl Notifier for ToastBoard {
    fn notify(&mut self, title: &str, message: &str) {
        self.current = Some(Notice::new(title, message));
    }
}

#[derive(Debug, Clone)]
pub enum UiMessage {
    UrlChanged(String),
    PastePressed,
    FetchPressed,
    FormatPicked(EncodingLabel),
    GoBackPressed,
    ToggleSaveTarget,
    DismissToast,
}

/// Paint the workflow snapshot.
pub fn view<'a>(
    state: &'a WorkflowState,
    url_input: &'a str,
    save_target: SaveTarget,
    toast: Option<&'a Notice>,
) -> Element<'a, UiMessage> {
    let body: Element<'a, UiMessage> = match state.catalog() {
        Some(catalog) => catalog_view(catalog, state.downloading_label()),
        None => input_view(url_input, state.is_busy()),
    };

    // Switching mid-download would not affect the running save.
    let save_toggle = button(text(save_target.label()).size(14))
        .on_press_maybe(state.downloading_label().is_none().then_some(UiMessage::ToggleSaveTarget))
        .padding([6, 12]);

    let mut page = column![
        text("YouTube Audio & Video Downloader").size(32),
        Space::new().height(Length::Fixed(20.0)),
    ];
    if let Some(notice) = toast {
        page = page.push(toast_view(notice));
        page = page.push(Space::new().height(Length::Fixed(10.0)));
    }

    page = page
        .push(body)
        .push(Space::new().height(Length::Fixed(20.0)))
        .push(save_toggle);

    container(page).padding(20).into()
}

fn input_view(url_input: &str, fetching: bool) -> Element<'_, UiMessage> {
    let fetch = if fetching {
        button("Fetching...").padding([10, 20])
    } else {
        button("Fetch")
            .on_press_maybe((!url_input.is_empty()).then_some(UiMessage::FetchPressed))
            .padding([10, 20])
    };

    column![
        text("Video URL:").size(16),
        row![
            button("Paste").on_press(UiMessage::PastePressed).padding([10, 20]),
            text_input("Paste YouTube video URL...", url_input)
                .on_input(UiMessage::UrlChanged)
                .on_submit(UiMessage::FetchPressed)
                .padding(10),
            fetch,
        ]
        .spacing(10),
    ]
    .spacing(10)
    .into()
}

fn catalog_view<'a>(
    catalog: &'a Catalog,
    in_flight: Option<&'a EncodingLabel>,
) -> Element<'a, UiMessage> {
    let info = &catalog.info;
    let title: String = info.title.chars().take(TITLE_PREVIEW_CHARS).collect();

    let mut page = column![
        button("Go Back").on_press(UiMessage::GoBackPressed).padding([10, 20]),
        text(format!("Title: {}", title)).size(16),
        text(format!("Author: {}", info.author)).size(16),
        text(format!("Duration: {} seconds", info.duration_seconds)).size(16),
        text(format!("Thumbnail: {}", info.thumbnail_url)).size(12),
        Space::new().height(Length::Fixed(10.0)),
    ]
    .spacing(8);

    if catalog.formats.is_empty() {
        return page
            .push(text("No formats available for this video.").size(16))
            .into();
    }

    page = page
        .push(text("Video:").size(16))
        .push(format_buttons(&catalog.formats.video, in_flight))
        .push(text("Audio:").size(16))
        .push(format_buttons(&catalog.formats.audio, in_flight));
    page.into()
}

fn format_buttons<'a>(
    labels: &'a [EncodingLabel],
    in_flight: Option<&'a EncodingLabel>,
) -> Element<'a, UiMessage> {
    let buttons: Vec<Element<'a, UiMessage>> = labels
        .iter()
        .map(|label| {
            if in_flight == Some(label) {
                button("Downloading...").padding([8, 16]).into()
            } else {
                button(text(label.as_str()))
                    .on_press_maybe(
                        in_flight
                            .is_none()
                            .then(|| UiMessage::FormatPicked(label.clone())),
                    )
                    .padding([8, 16])
                    .into()
            }
        })
        .collect();

    Row::with_children(buttons).spacing(8).into()
}

fn toast_view(notice: &Notice) -> Element<'_, UiMessage> {
    container(
        row![
            Column::new()
                .push(text(notice.title.as_str()).size(18))
                .push(text(notice.message.as_str()).size(14))
                .width(Length::Fill),
            button("x").on_press(UiMessage::DismissToast),
        ]
        .spacing(10),
    )
    .padding(10)
    .into()
}
