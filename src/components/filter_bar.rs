use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::app::FilterInput;
use crate::theme::ThemeColors;

/// Placeholder shown while the filter is empty.
pub const PLACEHOLDER: &str = "Search..";

/// Single-line filter input shown above the tree.
pub struct FilterBarWidget<'a> {
    input: &'a FilterInput,
    theme: &'a ThemeColors,
    focused: bool,
    match_count: Option<usize>,
}

impl<'a> FilterBarWidget<'a> {
    pub fn new(input: &'a FilterInput, theme: &'a ThemeColors, focused: bool) -> Self {
        Self {
            input,
            theme,
            focused,
            match_count: None,
        }
    }

    /// Show the number of visible rows in the title.
    pub fn match_count(mut self, count: usize) -> Self {
        self.match_count = Some(count);
        self
    }
}

impl<'a> Widget for FilterBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let border_fg = if self.focused {
            self.theme.border_focused_fg
        } else {
            self.theme.border_fg
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_fg));
        if let Some(count) = self.match_count.filter(|_| !self.input.text.is_empty()) {
            block = block.title(format!(" {} shown ", count));
        }
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let prompt = Span::styled(
            "/ ",
            Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD),
        );
        let text = &self.input.text;

        let line = if text.is_empty() && !self.focused {
            Line::from(vec![
                prompt,
                Span::styled(PLACEHOLDER, Style::default().fg(self.theme.dim_fg)),
            ])
        } else if self.focused {
            let cursor_style = Style::default()
                .bg(self.theme.tree_selected_fg)
                .fg(self.theme.status_bg);
            let pos = self.input.cursor_position.min(text.len());
            let (before, rest) = text.split_at(pos);
            let mut chars = rest.chars();
            let cursor_char = chars.next().map(String::from).unwrap_or_else(|| " ".into());
            let after = chars.as_str();
            let mut spans = vec![prompt, Span::raw(before), Span::styled(cursor_char, cursor_style)];
            spans.push(Span::raw(after));
            if text.is_empty() {
                spans.push(Span::styled(PLACEHOLDER, Style::default().fg(self.theme.dim_fg)));
            }
            Line::from(spans)
        } else {
            Line::from(vec![prompt, Span::raw(text.as_str())])
        };

        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
