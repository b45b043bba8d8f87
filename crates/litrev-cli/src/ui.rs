//! TUI implementation for litrev

use crate::form::{self, MAX_TOPIC_CHARS, MODEL_OPTIONS};
use crossterm::event::{Event, EventStream, MouseEventKind};
use futures::StreamExt;
use litrev_api::{CreateReviewRequest, Paper, ReviewResponse, ReviewStatus, ReviewsApi};
use litrev_session::progress::{ResearchProgress, summary_messages};
use litrev_session::{SessionEvent, SessionStore, StreamSession};
use litrev_tui::{
    App, Theme, ThemeMode,
    input::{Action, event_to_action},
    widgets::{
        FailureCard, InputBox, MessageList, PaperList, PapersView, ProgressCard, Selector,
        SelectorItem, SelectorState, Spinner, SummaryCard, message_list::transcript_height,
    },
};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast::error::RecvError, mpsc};

/// Store key for the chosen color theme
pub const THEME_KEY: &str = "litrev.theme";

/// Results of API calls running in the background
#[derive(Debug)]
pub enum ApiReply {
    /// Review creation finished; the error is user-facing text
    Created(Result<ReviewResponse, String>),
    /// Papers of a completed review
    Papers {
        review_id: String,
        result: Result<Vec<Paper>, String>,
    },
}

/// What the event loop should do after an input action
#[derive(Debug, PartialEq)]
pub enum UiCommand {
    None,
    Quit,
    Create(CreateReviewRequest),
    NewSearch,
}

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Topic entry
    Search,
    /// Following a review
    Review,
}

/// Settings the TUI starts with
pub struct TuiOptions {
    pub model: String,
    pub num_papers: u32,
    pub theme: ThemeMode,
    /// Submit this topic right away
    pub topic: Option<String>,
}

/// Theme stored by a previous run, if any
pub fn stored_theme(store: &dyn SessionStore) -> Option<ThemeMode> {
    match store.get(THEME_KEY) {
        Ok(value) => value.and_then(|v| v.parse().ok()),
        Err(e) => {
            tracing::warn!("Failed to read stored theme: {}", e);
            None
        }
    }
}

/// TUI application state
pub struct TuiState {
    screen: Screen,
    input: InputBox,
    theme: Theme,
    model: String,
    num_papers: u32,
    model_selector: SelectorState,
    /// Validation or creation error shown above the input
    banner: Option<String>,
    /// A create request is in flight
    creating: bool,
    topic: Option<String>,
    /// Transcript scroll; `usize::MAX` follows the newest message
    scroll: usize,
    papers: PapersView,
    papers_scroll: usize,
    /// Scroll keys move the papers panel instead of the transcript
    focus_papers: bool,
    spinner_start: Instant,
    store: Arc<dyn SessionStore>,
}

impl TuiState {
    pub fn new(store: Arc<dyn SessionStore>, model: String, num_papers: u32, theme: ThemeMode) -> Self {
        let mut input = InputBox::new()
            .with_title(" Research topic ")
            .with_placeholder("e.g. graph neural networks for drug discovery")
            .with_max_chars(MAX_TOPIC_CHARS);
        input.set_focused(true);

        Self {
            screen: Screen::Search,
            input,
            theme: Theme::for_mode(theme),
            model,
            num_papers,
            model_selector: SelectorState::default(),
            banner: None,
            creating: false,
            topic: None,
            scroll: 0,
            papers: PapersView::Hidden,
            papers_scroll: 0,
            focus_papers: false,
            spinner_start: Instant::now(),
            store,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    fn show_review(&mut self) {
        self.screen = Screen::Review;
        self.creating = false;
        self.banner = None;
        self.papers = PapersView::Hidden;
        self.papers_scroll = 0;
        self.focus_papers = false;
        self.scroll_to_bottom();
    }

    fn show_search(&mut self) {
        self.screen = Screen::Search;
        self.input.clear();
        self.topic = None;
        self.banner = None;
        self.creating = false;
        self.papers = PapersView::Hidden;
        self.scroll = 0;
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved against the content height during render
        self.scroll = usize::MAX;
    }

    fn scroll_by(&mut self, delta: isize) {
        let target = if self.focus_papers {
            &mut self.papers_scroll
        } else {
            &mut self.scroll
        };
        *target = if delta < 0 {
            target.saturating_sub(delta.unsigned_abs())
        } else {
            target.saturating_add(delta as usize)
        };
    }

    fn toggle_theme(&mut self) {
        self.theme.toggle();
        if let Err(e) = self.store.set(THEME_KEY, self.theme.mode.as_str()) {
            tracing::warn!("Failed to store theme: {}", e);
        }
    }

    fn model_label(&self) -> &str {
        MODEL_OPTIONS
            .iter()
            .find(|(id, _)| *id == self.model)
            .map(|(_, label)| *label)
            .unwrap_or(&self.model)
    }

    /// Handle keyboard action
    pub fn handle_action(&mut self, action: Action, width: u16) -> UiCommand {
        if matches!(action, Action::Interrupt) {
            return UiCommand::Quit;
        }
        if matches!(action, Action::ToggleTheme) {
            self.toggle_theme();
            return UiCommand::None;
        }

        match self.screen {
            Screen::Search => self.handle_search_action(action, width),
            Screen::Review => self.handle_review_action(action),
        }
    }

    fn handle_search_action(&mut self, action: Action, width: u16) -> UiCommand {
        if self.model_selector.visible {
            match action {
                Action::Up => self.model_selector.up(MODEL_OPTIONS.len()),
                Action::Down => self.model_selector.down(MODEL_OPTIONS.len()),
                Action::Submit => {
                    if let Some((id, _)) = MODEL_OPTIONS.get(self.model_selector.selected) {
                        self.model = id.to_string();
                    }
                    self.model_selector.hide();
                }
                Action::Escape | Action::ModelSelect => self.model_selector.hide(),
                _ => {}
            }
            return UiCommand::None;
        }

        match action {
            Action::Submit => {
                if self.creating {
                    return UiCommand::None;
                }
                match form::build_request(self.input.content(), &self.model, self.num_papers) {
                    Ok(request) => {
                        self.banner = None;
                        self.creating = true;
                        self.spinner_start = Instant::now();
                        self.topic = Some(request.topic.clone());
                        UiCommand::Create(request)
                    }
                    Err(e) => {
                        self.banner = Some(e);
                        UiCommand::None
                    }
                }
            }
            Action::ModelSelect => {
                if !self.creating {
                    self.model_selector.selected = form::model_index(&self.model).unwrap_or(0);
                    self.model_selector.show();
                }
                UiCommand::None
            }
            Action::Escape => {
                if self.banner.take().is_some() {
                    UiCommand::None
                } else {
                    UiCommand::Quit
                }
            }
            _ => {
                self.input.handle_action(&action, width);
                UiCommand::None
            }
        }
    }

    fn handle_review_action(&mut self, action: Action) -> UiCommand {
        match action {
            Action::NewSearch => return UiCommand::NewSearch,
            Action::Tab | Action::BackTab => {
                if matches!(self.papers, PapersView::Loaded(_)) {
                    self.focus_papers = !self.focus_papers;
                }
            }
            Action::Up => self.scroll_by(-1),
            Action::Down => self.scroll_by(1),
            Action::PageUp => self.scroll_by(-10),
            Action::PageDown => self.scroll_by(10),
            Action::Home => {
                if self.focus_papers {
                    self.papers_scroll = 0;
                } else {
                    self.scroll = 0;
                }
            }
            Action::End => {
                if !self.focus_papers {
                    self.scroll_to_bottom();
                }
            }
            _ => {}
        }
        UiCommand::None
    }

    /// Handle session events
    pub fn handle_session_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started { .. } | SessionEvent::Restored { .. } => {
                self.papers = PapersView::Hidden;
                self.scroll_to_bottom();
            }
            SessionEvent::MessageAppended { .. } => self.scroll_to_bottom(),
            SessionEvent::StatusChanged { status } => {
                tracing::debug!("Review status: {}", status);
            }
            SessionEvent::ErrorChanged { .. } | SessionEvent::StreamingChanged { .. } => {}
        }
    }

    /// Review whose papers should be fetched now. Marks the panel as loading.
    pub fn take_papers_request(&mut self, session: &StreamSession) -> Option<String> {
        if self.screen != Screen::Review
            || session.status() != ReviewStatus::Completed
            || session.messages().is_empty()
            || self.papers != PapersView::Hidden
        {
            return None;
        }
        let review_id = session.review_id()?.to_string();
        self.papers = PapersView::Loading;
        Some(review_id)
    }

    /// Apply the result of a background API call
    pub fn apply_reply(&mut self, reply: ApiReply, session: &mut StreamSession) {
        match reply {
            ApiReply::Created(Ok(review)) => {
                tracing::info!("Created review {}", review.id);
                match session.start(&review.id) {
                    Ok(()) => self.show_review(),
                    Err(e) => {
                        self.creating = false;
                        self.banner = Some(e.to_string());
                    }
                }
            }
            ApiReply::Created(Err(message)) => {
                self.creating = false;
                self.banner = Some(message);
            }
            ApiReply::Papers { review_id, result } => {
                if session.review_id() != Some(review_id.as_str()) {
                    return;
                }
                self.papers = match result {
                    Ok(papers) => PapersView::Loaded(papers),
                    Err(e) => PapersView::Failed(e),
                };
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame, session: &StreamSession) {
        match self.screen {
            Screen::Search => self.render_search(frame),
            Screen::Review => self.render_review(frame, session),
        }
    }

    fn render_search(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.theme.base_style()), area);

        let [welcome, banner, status, input] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(if self.banner.is_some() { 1 } else { 0 }),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .areas(area);

        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), self.theme.accent_style()),
                Span::styled(what, self.theme.base_style()),
            ])
        };
        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  litrev", self.theme.accent_bold()),
                Span::styled(" - literature review assistant", self.theme.dim_style()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  Model: {} │ Papers: {}",
                    self.model_label(),
                    self.num_papers
                ),
                self.theme.dim_style(),
            )),
            Line::from(""),
            Line::from(Span::styled("  Keybindings", self.theme.warning_style())),
            Line::from(""),
            key("Enter", "Start review"),
            key("Ctrl+K", "Select model"),
            key("Ctrl+T", "Toggle theme"),
            key("Ctrl+C", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "  Describe a research topic to get started...",
                self.theme.dim_style(),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), welcome);

        if let Some(ref message) = self.banner {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" ✗ {}", message), self.theme.error_style())),
                banner,
            );
        }

        if self.creating {
            let spinner =
                Spinner::new("Creating review...", &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, status);
        } else {
            let count = format!(" {}/{}", self.input.char_count(), MAX_TOPIC_CHARS);
            frame.render_widget(
                Paragraph::new(Span::styled(count, self.theme.dim_style())),
                status,
            );
        }

        self.input.render(input, frame.buffer_mut(), &self.theme);

        if self.model_selector.visible {
            let items: Vec<SelectorItem> = MODEL_OPTIONS
                .iter()
                .map(|(id, label)| SelectorItem {
                    label,
                    description: Some(*id),
                    is_current: *id == self.model,
                })
                .collect();
            Selector::new("Select Model", items, &self.theme)
                .with_selected(self.model_selector.selected)
                .render_centered(area, frame.buffer_mut());
        }
    }

    fn render_review(&mut self, frame: &mut Frame, session: &StreamSession) {
        let area = frame.area();
        frame.render_widget(Block::default().style(self.theme.base_style()), area);

        let [header, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header, session);

        match session.status() {
            ReviewStatus::Completed => {
                let [left, right] =
                    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                        .areas(body);
                let [summary_area, papers_area] =
                    Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                        .areas(right);
                self.render_transcript(frame, left, session);

                let summaries = summary_messages(session.messages());
                frame.render_widget(
                    SummaryCard::new(summaries.last().copied(), &self.theme),
                    summary_area,
                );
                self.render_papers(frame, papers_area);
            }
            ReviewStatus::Failed => {
                let [card, rest] =
                    Layout::vertical([Constraint::Length(5), Constraint::Min(1)]).areas(body);
                frame.render_widget(FailureCard::new(session.error(), &self.theme), card);
                self.render_transcript(frame, rest, session);
            }
            ReviewStatus::Pending | ReviewStatus::InProgress => {
                let progress = ProgressCard::new(
                    ResearchProgress::from_messages(session.messages()),
                    &self.theme,
                )
                .with_start_time(self.spinner_start);
                let [card, rest] =
                    Layout::vertical([Constraint::Length(progress.height()), Constraint::Min(1)])
                        .areas(body);
                frame.render_widget(progress, card);
                self.render_transcript(frame, rest, session);
            }
        }

        self.render_status(frame, status, session);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, session: &StreamSession) {
        let subject = match (&self.topic, session.review_id()) {
            (Some(topic), _) => topic.clone(),
            (None, Some(id)) => format!("review {}", id),
            (None, None) => String::new(),
        };
        let status_style = match session.status() {
            ReviewStatus::Completed => self.theme.success_style(),
            ReviewStatus::Failed => self.theme.error_style(),
            _ => self.theme.accent_style(),
        };
        let line = Line::from(vec![
            Span::styled(" litrev │ ", self.theme.accent_bold()),
            Span::styled(subject, self.theme.base_style()),
            Span::styled(format!(" │ {}", status_label(session.status())), status_style),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_transcript(&mut self, frame: &mut Frame, area: Rect, session: &StreamSession) {
        let messages = session.messages();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.focus_papers {
                self.theme.border_style()
            } else {
                self.theme.accent_style()
            })
            .title(format!(" Agent messages ({}) ", messages.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        if messages.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("Waiting for agents...", self.theme.dim_style())),
                inner,
            );
            return;
        }

        let content_height = transcript_height(messages, &self.theme, inner.width as usize);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        if self.scroll == usize::MAX {
            // Auto-scroll, stays pinned until the user scrolls
            frame.render_widget(
                MessageList::new(messages, &self.theme).scroll(max_scroll),
                inner,
            );
        } else {
            self.scroll = self.scroll.min(max_scroll);
            frame.render_widget(
                MessageList::new(messages, &self.theme).scroll(self.scroll),
                inner,
            );
        }

        if content_height > inner.height as usize {
            let position = if self.scroll == usize::MAX {
                max_scroll
            } else {
                self.scroll
            };
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");
            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(position)
                .viewport_content_length(inner.height as usize);
            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_papers(&mut self, frame: &mut Frame, area: Rect) {
        let list = PaperList::new(&self.papers, &self.theme);
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let max_scroll = list.lines(inner_width).len().saturating_sub(inner_height);
        self.papers_scroll = self.papers_scroll.min(max_scroll);
        frame.render_widget(
            PaperList::new(&self.papers, &self.theme).scroll(self.papers_scroll),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, session: &StreamSession) {
        if session.is_streaming() {
            let spinner = Spinner::new("Streaming agent messages...", &self.theme)
                .with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left_content = format!(" {} │ {}", self.model_label(), status_label(session.status()));
        let right_content = if matches!(self.papers, PapersView::Loaded(_)) {
            "Tab: focus │ Ctrl+N: new search │ Ctrl+T: theme │ Ctrl+C: quit "
        } else {
            "Ctrl+N: new search │ Ctrl+T: theme │ Ctrl+C: quit "
        };

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, self.theme.dim_style()),
            ])
        } else {
            Line::from(Span::styled(left_content, self.theme.dim_style()))
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn status_label(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Pending => "Pending",
        ReviewStatus::InProgress => "In progress",
        ReviewStatus::Completed => "Completed",
        ReviewStatus::Failed => "Failed",
    }
}

/// Forget the stored review, then create the new one in the background
fn spawn_create(
    api: Arc<dyn ReviewsApi>,
    tx: mpsc::Sender<ApiReply>,
    session: &StreamSession,
    request: CreateReviewRequest,
) {
    if let Err(e) = session.clear_session() {
        tracing::warn!("Failed to clear session: {}", e);
    }
    tokio::spawn(async move {
        let result = api
            .create_review(&request)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to create review: {}", e);
                e.user_message()
            });
        let _ = tx.send(ApiReply::Created(result)).await;
    });
}

fn spawn_papers(api: Arc<dyn ReviewsApi>, tx: mpsc::Sender<ApiReply>, review_id: String) {
    tokio::spawn(async move {
        let result = api
            .get_review(&review_id)
            .await
            .map(|review| review.papers)
            .map_err(|e| e.to_string());
        let _ = tx.send(ApiReply::Papers { review_id, result }).await;
    });
}

/// Run the TUI application
pub async fn run_tui(
    api: Arc<dyn ReviewsApi>,
    session: &mut StreamSession,
    store: Arc<dyn SessionStore>,
    options: TuiOptions,
) -> anyhow::Result<()> {
    let mut state = TuiState::new(store, options.model, options.num_papers, options.theme);
    let mut session_rx = session.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ApiReply>(8);

    if let Some(topic) = options.topic {
        state.input.set_content(topic);
        if let UiCommand::Create(request) = state.handle_action(Action::Submit, 0) {
            spawn_create(api.clone(), reply_tx.clone(), session, request);
        }
    } else if let Some(review_id) = session.stored_review_id() {
        tracing::info!("Resuming review {}", review_id);
        session.start(&review_id)?;
        state.show_review();
    }

    let mut app = App::new()?;
    let mut event_stream = EventStream::new();

    // Tick interval for animations (80ms for smooth spinner)
    let mut tick_interval = tokio::time::interval(Duration::from_millis(80));

    loop {
        if let Some(review_id) = state.take_papers_request(session) {
            spawn_papers(api.clone(), reply_tx.clone(), review_id);
        }

        app.draw(|frame| state.render(frame, session))?;
        let area_width = app.size()?.width;

        let command = tokio::select! {
            Some(event) = session.next_event(), if session.is_streaming() => {
                session.on_event(event);
                UiCommand::None
            }

            event = session_rx.recv() => {
                match event {
                    Ok(event) => state.handle_session_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("UI skipped {} session events", skipped);
                        state.scroll_to_bottom();
                    }
                    Err(RecvError::Closed) => {}
                }
                UiCommand::None
            }

            Some(reply) = reply_rx.recv() => {
                state.apply_reply(reply, session);
                UiCommand::None
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Mouse(mouse))) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => state.scroll_by(-3),
                            MouseEventKind::ScrollDown => state.scroll_by(3),
                            _ => {}
                        }
                        UiCommand::None
                    }
                    Some(Ok(event)) => match event_to_action(event) {
                        Some(action) => state.handle_action(action, area_width),
                        None => UiCommand::None,
                    },
                    Some(Err(e)) => {
                        break Err(anyhow::anyhow!("Event error: {}", e));
                    }
                    None => break Ok(()),
                }
            }

            // Tick for animations (spinner updates)
            _ = tick_interval.tick() => UiCommand::None,
        };

        match command {
            UiCommand::None => {}
            UiCommand::Quit => break Ok(()),
            UiCommand::Create(request) => {
                tracing::info!("Creating review for {:?}", request.topic);
                spawn_create(api.clone(), reply_tx.clone(), session, request);
            }
            UiCommand::NewSearch => {
                session.stop();
                if let Err(e) = session.clear_session() {
                    tracing::warn!("Failed to clear session: {}", e);
                }
                state.show_search();
            }
        }
    }
}
