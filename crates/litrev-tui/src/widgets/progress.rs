//! Status cards: research progress, final summary, failure

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use crate::widgets::spinner::frame_at;
use litrev_api::Message;
use litrev_session::progress::{ResearchProgress, clean_summary};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use std::time::Instant;

/// Card shown while a review is in progress
pub struct ProgressCard<'a> {
    progress: ResearchProgress,
    theme: &'a Theme,
    started: Instant,
}

impl<'a> ProgressCard<'a> {
    pub fn new(progress: ResearchProgress, theme: &'a Theme) -> Self {
        Self {
            progress,
            theme,
            started: Instant::now(),
        }
    }

    pub fn with_start_time(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Rows needed to render the card
    pub fn height(&self) -> u16 {
        if self.progress.total_papers > 0 { 5 } else { 4 }
    }
}

impl Widget for ProgressCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let [title_row, stage_row, gauge_row] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} ", frame_at(self.started)),
                self.theme.accent_style(),
            ),
            Span::styled(
                "Conducting Deep Research",
                self.theme.base_style().add_modifier(Modifier::BOLD),
            ),
            Span::styled("  [In progress]", self.theme.accent_style()),
        ]))
        .render(title_row, buf);

        Paragraph::new(Span::styled(
            format!("  {}", self.progress.stage.label()),
            self.theme.dim_style(),
        ))
        .render(stage_row, buf);

        if self.progress.total_papers > 0 {
            Gauge::default()
                .gauge_style(self.theme.accent_style())
                .percent(self.progress.percent().min(100))
                .label(format!(
                    "{}/{} papers ({}%)",
                    self.progress.processed_papers,
                    self.progress.total_papers,
                    self.progress.percent()
                ))
                .render(gauge_row, buf);
        }
    }
}

/// Card with the final literature review summary
pub struct SummaryCard<'a> {
    summary: Option<&'a Message>,
    theme: &'a Theme,
}

impl<'a> SummaryCard<'a> {
    /// Show `summary`, or a placeholder when there is none
    pub fn new(summary: Option<&'a Message>, theme: &'a Theme) -> Self {
        Self { summary, theme }
    }

    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        match self.summary {
            Some(message) => render_markdown(&clean_summary(&message.content), self.theme, width),
            None => vec![Line::from(Span::styled(
                "No summaries available yet",
                self.theme.dim_style(),
            ))],
        }
    }
}

impl Widget for SummaryCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.success_style())
            .title(" Literature Review Summary ")
            .title_style(self.theme.success_style().add_modifier(Modifier::BOLD));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines(inner.width as usize);
        Paragraph::new(lines).render(inner, buf);
    }
}

/// Card shown when the review failed
pub struct FailureCard<'a> {
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> FailureCard<'a> {
    pub fn new(error: Option<&'a str>, theme: &'a Theme) -> Self {
        Self { error, theme }
    }
}

impl Widget for FailureCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.error_style());
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    "✗ Research failed",
                    self.theme.error_style().add_modifier(Modifier::BOLD),
                ),
                Span::styled("  [Error]", self.theme.error_style()),
            ]),
        ];
        if let Some(error) = self.error {
            lines.push(Line::from(Span::styled(
                format!("  {}", error),
                self.theme.base_style(),
            )));
        }
        lines.push(Line::from(Span::styled(
            "  Please try again. Ctrl+N starts a new search.",
            self.theme.dim_style(),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
