//! Markdown rendering for review summaries

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

/// Convert markdown text to styled lines no wider than `width` columns
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut styles: Vec<Style> = vec![theme.base_style()];
    let mut code_block: Option<String> = None;
    let mut list_depth: usize = 0;

    let flush = |current: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>| {
        if !current.is_empty() {
            lines.extend(wrap_spans(std::mem::take(current), width));
        }
    };

    for event in Parser::new(text) {
        let style = styles.last().copied().unwrap_or_default();
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    flush(&mut current, &mut lines);
                    let heading = match level {
                        HeadingLevel::H1 => theme
                            .accent_style()
                            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                        HeadingLevel::H2 => theme.accent_bold(),
                        _ => theme.accent_style(),
                    };
                    styles.push(heading);
                }
                Tag::Paragraph => flush(&mut current, &mut lines),
                Tag::CodeBlock(_) => {
                    flush(&mut current, &mut lines);
                    code_block = Some(String::new());
                }
                Tag::List(_) => list_depth += 1,
                Tag::Item => {
                    flush(&mut current, &mut lines);
                    let indent = "  ".repeat(list_depth.saturating_sub(1));
                    current.push(Span::styled(format!("{}• ", indent), theme.dim_style()));
                }
                Tag::Emphasis => styles.push(style.add_modifier(Modifier::ITALIC)),
                Tag::Strong => styles.push(style.add_modifier(Modifier::BOLD)),
                Tag::Strikethrough => styles.push(style.add_modifier(Modifier::CROSSED_OUT)),
                Tag::Link { .. } => styles.push(theme.link_style().add_modifier(style.add_modifier)),
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_) => {
                    flush(&mut current, &mut lines);
                    styles.pop();
                }
                TagEnd::Paragraph => {
                    flush(&mut current, &mut lines);
                    lines.push(Line::from(""));
                }
                TagEnd::CodeBlock => {
                    let code_style = theme.code_style().add_modifier(Modifier::DIM);
                    let max = width.saturating_sub(2);
                    for code_line in code_block.take().unwrap_or_default().lines() {
                        let shown = if code_line.width() > max {
                            let mut cut: String = String::new();
                            for c in code_line.chars() {
                                if (cut.width() + 2) > max {
                                    break;
                                }
                                cut.push(c);
                            }
                            format!("  {}…", cut)
                        } else {
                            format!("  {}", code_line)
                        };
                        lines.push(Line::from(Span::styled(shown, code_style)));
                    }
                    lines.push(Line::from(""));
                }
                TagEnd::List(_) => {
                    list_depth = list_depth.saturating_sub(1);
                    if list_depth == 0 {
                        lines.push(Line::from(""));
                    }
                }
                TagEnd::Item => flush(&mut current, &mut lines),
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                    if styles.len() > 1 {
                        styles.pop();
                    }
                }
                _ => {}
            },
            Event::Text(text) => match code_block.as_mut() {
                Some(code) => code.push_str(&text),
                None => current.push(Span::styled(text.into_string(), style)),
            },
            Event::Code(code) => {
                current.push(Span::styled(
                    format!("`{}`", code),
                    theme.code_style().add_modifier(Modifier::BOLD),
                ));
            }
            Event::SoftBreak => current.push(Span::styled(" ", style)),
            Event::HardBreak => flush(&mut current, &mut lines),
            _ => {}
        }
    }

    flush(&mut current, &mut lines);

    while lines
        .last()
        .is_some_and(|l| l.spans.iter().all(|s| s.content.is_empty()))
    {
        lines.pop();
    }

    lines
}

/// Greedy word wrap over styled spans.
///
/// Words longer than `width` are split by character.
pub fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in spans {
        let style = span.style;
        let mut rest: &str = &span.content;
        while !rest.is_empty() {
            // Next token: run of spaces or run of non-spaces
            let split = if rest.starts_with(' ') {
                rest.find(|c| c != ' ').unwrap_or(rest.len())
            } else {
                rest.find(' ').unwrap_or(rest.len())
            };
            let (token, tail) = rest.split_at(split);
            rest = tail;
            let is_space = token.starts_with(' ');
            let token_width = token.width();

            if used + token_width <= width {
                line.push(Span::styled(token.to_string(), style));
                used += token_width;
                continue;
            }
            if is_space {
                // Breaking here; drop the spaces
                lines.push(finish_line(std::mem::take(&mut line)));
                used = 0;
                continue;
            }
            if used > 0 && token_width <= width {
                lines.push(finish_line(std::mem::take(&mut line)));
                line.push(Span::styled(token.to_string(), style));
                used = token_width;
                continue;
            }
            for c in token.chars() {
                let cw = c.to_string().width();
                if used + cw > width && used > 0 {
                    lines.push(finish_line(std::mem::take(&mut line)));
                    used = 0;
                }
                line.push(Span::styled(c.to_string(), style));
                used += cw;
            }
        }
    }

    if !line.is_empty() {
        lines.push(finish_line(line));
    }
    lines
}

fn finish_line(mut spans: Vec<Span<'static>>) -> Line<'static> {
    while spans.last().is_some_and(|s| s.content.trim().is_empty()) {
        spans.pop();
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_paragraphs() {
        let theme = Theme::dark();
        let lines = render_markdown("First paragraph.\n\nSecond one.", &theme, 80);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["First paragraph.", "", "Second one."]);
    }

    #[test]
    fn test_link_keeps_label() {
        let theme = Theme::dark();
        let lines = render_markdown("See **[Attention](http://arxiv.org/1)** now", &theme, 80);
        assert_eq!(plain(&lines[0]), "See Attention now");
        let link = lines[0]
            .spans
            .iter()
            .find(|s| s.content == "Attention")
            .unwrap();
        assert_eq!(link.style.fg, Some(theme.link));
        assert!(link.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_code_block_is_clipped() {
        let theme = Theme::dark();
        let md = "```\nabcdefghijklmnopqrstuvwxyz\n```";
        let lines = render_markdown(md, &theme, 12);
        assert_eq!(lines.len(), 1);
        assert!(plain(&lines[0]).ends_with('…'));
        assert!(plain(&lines[0]).width() <= 12);
    }

    #[test]
    fn test_list_items() {
        let theme = Theme::dark();
        let lines = render_markdown("- one\n- two", &theme, 80);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, vec!["• one", "• two"]);
    }

    #[test]
    fn test_wrap_spans() {
        let spans = vec![Span::raw("the quick brown fox")];
        let lines: Vec<String> = wrap_spans(spans, 10).iter().map(plain).collect();
        assert_eq!(lines, vec!["the quick", "brown fox"]);

        let lines: Vec<String> = wrap_spans(vec![Span::raw("abcdefgh")], 3)
            .iter()
            .map(plain)
            .collect();
        assert_eq!(lines, vec!["abc", "def", "gh"]);
    }
}
