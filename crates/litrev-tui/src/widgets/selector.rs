//! Popup list for picking one option

use crate::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Maximum width for selector popups
const MAX_POPUP_WIDTH: u16 = 60;

/// An entry in the selector
pub struct SelectorItem<'a> {
    pub label: &'a str,
    /// Dimmed text after the label
    pub description: Option<&'a str>,
    /// Marked with a bullet as the active choice
    pub is_current: bool,
}

/// A centered popup list
pub struct Selector<'a> {
    title: &'a str,
    items: Vec<SelectorItem<'a>>,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    /// Create a selector highlighting the current item
    pub fn new(title: &'a str, items: Vec<SelectorItem<'a>>, theme: &'a Theme) -> Self {
        let selected = items.iter().position(|item| item.is_current).unwrap_or(0);
        Self {
            title,
            items,
            selected,
            theme,
        }
    }

    pub fn with_selected(mut self, index: usize) -> Self {
        self.selected = index.min(self.items.len().saturating_sub(1));
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn popup_size(&self) -> (u16, u16) {
        let widest = self
            .items
            .iter()
            .map(|item| item.label.width() + item.description.map_or(0, |d| d.width() + 3) + 4)
            .max()
            .unwrap_or(0)
            .max(self.title.width() + 4);
        let width = (widest as u16 + 2).clamp(20, MAX_POPUP_WIDTH);
        let height = (self.items.len() as u16 + 2).min(20);
        (width, height)
    }

    fn list_item(&self, index: usize, item: &SelectorItem<'_>) -> ListItem<'static> {
        let marker = if item.is_current { "● " } else { "  " };
        let label_style = if index == self.selected {
            Style::default()
                .bg(self.theme.accent)
                .fg(self.theme.bg)
                .add_modifier(Modifier::BOLD)
        } else if item.is_current {
            self.theme.accent_style()
        } else {
            self.theme.base_style()
        };

        let mut spans = vec![Span::styled(format!("{}{}", marker, item.label), label_style)];
        if let Some(description) = item.description {
            spans.push(Span::styled(format!("  {}", description), self.theme.dim_style()));
        }
        ListItem::new(Line::from(spans))
    }

    /// Render the popup centered in `area`
    pub fn render_centered(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.popup_size();
        let width = width.min(area.width);
        let height = height.min(area.height);
        let popup = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );

        Clear.render(popup, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(self.theme.accent_bold())
            .borders(Borders::ALL)
            .border_style(self.theme.accent_style());

        let items: Vec<ListItem> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| self.list_item(i, item))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        state.select(Some(self.selected));

        StatefulWidget::render(list, popup, buf, &mut state);
    }
}

/// Visibility and cursor of a selector popup
#[derive(Debug, Default)]
pub struct SelectorState {
    pub selected: usize,
    pub visible: bool,
}

impl SelectorState {
    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move selection up, wrapping to the bottom
    pub fn up(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = if self.selected == 0 {
            item_count - 1
        } else {
            self.selected - 1
        };
    }

    /// Move selection down, wrapping to the top
    pub fn down(&mut self, item_count: usize) {
        if item_count == 0 {
            return;
        }
        self.selected = (self.selected + 1) % item_count;
    }
}
