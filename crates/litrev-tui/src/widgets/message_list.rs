//! Transcript of agent messages

use crate::format::format_time;
use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use litrev_api::{Message, MessageType};
use litrev_session::progress::{
    clean_summary, is_search_message, is_summary_message, parse_search_results,
};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// How a message is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Search,
    Summary,
    Error,
    Other,
}

fn kind_of(message: &Message) -> Kind {
    if message.message_type == Some(MessageType::Error) {
        Kind::Error
    } else if is_search_message(message) {
        Kind::Search
    } else if is_summary_message(message) {
        Kind::Summary
    } else {
        Kind::Other
    }
}

/// Lines for one message, including the trailing blank separator
pub fn message_lines(message: &Message, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let kind = kind_of(message);
    let (icon, color) = match kind {
        Kind::Search => ("⌕", theme.search),
        Kind::Summary => ("✎", theme.summary),
        Kind::Error => ("✗", theme.error),
        Kind::Other => ("●", theme.accent),
    };

    let mut header = vec![Span::styled(
        format!("{} {}", icon, message.source),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(time) = format_time(&message.timestamp) {
        header.push(Span::styled(format!("  {}", time), theme.dim_style()));
    }
    let mut lines = vec![Line::from(header)];

    let body_width = width.saturating_sub(2);
    let body: Vec<Line<'static>> = match kind {
        Kind::Summary => render_markdown(&clean_summary(&message.content), theme, body_width),
        Kind::Search => match parse_search_results(&message.content) {
            Some(papers) => vec![Line::from(Span::styled(
                format!("Found {} candidate papers", papers.len()),
                theme.dim_style(),
            ))],
            None => plain_lines(&message.content, theme.base_style(), body_width),
        },
        Kind::Error => plain_lines(&message.content, theme.error_style(), body_width),
        Kind::Other => plain_lines(&message.content, theme.base_style(), body_width),
    };

    for line in body {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(line.spans);
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines
}

fn plain_lines(content: &str, style: Style, width: usize) -> Vec<Line<'static>> {
    content
        .lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![Line::from("")]
            } else {
                textwrap::wrap(line, width.max(1))
                    .into_iter()
                    .map(|part| Line::from(Span::styled(part.into_owned(), style)))
                    .collect()
            }
        })
        .collect()
}

/// Lines for a whole transcript
pub fn transcript_lines(messages: &[Message], theme: &Theme, width: usize) -> Vec<Line<'static>> {
    messages
        .iter()
        .flat_map(|m| message_lines(m, theme, width))
        .collect()
}

/// Height of the rendered transcript in rows
pub fn transcript_height(messages: &[Message], theme: &Theme, width: usize) -> usize {
    transcript_lines(messages, theme, width).len()
}

/// Scrollable list of agent messages
pub struct MessageList<'a> {
    messages: &'a [Message],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [Message], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// First visible row
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible: Vec<Line> = transcript_lines(self.messages, self.theme, area.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}
