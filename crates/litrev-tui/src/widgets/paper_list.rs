//! Papers of a completed review

use crate::format::{format_authors, format_date, truncate_text};
use crate::theme::Theme;
use crate::widgets::markdown::wrap_spans;
use litrev_api::Paper;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Abstracts are cut to this many characters
const SUMMARY_CHARS: usize = 300;

/// What the papers panel currently knows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PapersView {
    /// Review not completed yet
    #[default]
    Hidden,
    Loading,
    Loaded(Vec<Paper>),
    /// Fetch failed; the message is shown in place of the list
    Failed(String),
}

/// Lines for one paper card
pub fn paper_lines(index: usize, paper: &Paper, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = wrap_spans(
        vec![Span::styled(
            format!("{}. {}", index + 1, paper.title.trim()),
            theme.base_style().add_modifier(Modifier::BOLD),
        )],
        width,
    );

    let mut meta = format_authors(&paper.authors);
    if !paper.published.is_empty() {
        meta.push_str(" · ");
        meta.push_str(&format_date(&paper.published));
    }
    lines.extend(wrap_spans(vec![Span::styled(meta, theme.dim_style())], width));

    if !paper.summary.is_empty() {
        let summary = truncate_text(&paper.summary.replace('\n', " "), SUMMARY_CHARS);
        lines.extend(wrap_spans(vec![Span::styled(summary, theme.base_style())], width));
    }
    if !paper.pdf_url.is_empty() {
        lines.push(Line::from(Span::styled(
            paper.pdf_url.clone(),
            theme.link_style(),
        )));
    }
    lines.push(Line::from(""));
    lines
}

/// Bordered panel listing the papers of a review
pub struct PaperList<'a> {
    view: &'a PapersView,
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> PaperList<'a> {
    pub fn new(view: &'a PapersView, theme: &'a Theme) -> Self {
        Self {
            view,
            theme,
            scroll: 0,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// Content lines for the given inner width
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        match self.view {
            PapersView::Hidden => Vec::new(),
            PapersView::Loading => vec![Line::from(Span::styled(
                "Loading papers...",
                self.theme.dim_style(),
            ))],
            PapersView::Failed(error) => vec![Line::from(Span::styled(
                format!("Failed to load papers: {}", error),
                self.theme.error_style(),
            ))],
            PapersView::Loaded(papers) if papers.is_empty() => vec![Line::from(Span::styled(
                "No papers found",
                self.theme.dim_style(),
            ))],
            PapersView::Loaded(papers) => papers
                .iter()
                .enumerate()
                .flat_map(|(i, paper)| paper_lines(i, paper, self.theme, width))
                .collect(),
        }
    }
}

impl Widget for PaperList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.view {
            PapersView::Loaded(papers) => format!(" Papers ({}) ", papers.len()),
            _ => " Papers ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let visible: Vec<Line> = self
            .lines(inner.width as usize)
            .into_iter()
            .skip(self.scroll)
            .take(inner.height as usize)
            .collect();
        Paragraph::new(visible).render(inner, buf);
    }
}
