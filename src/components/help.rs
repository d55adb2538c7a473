use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// A single keybinding entry for display.
struct KeyEntry {
    key: &'static str,
    description: &'static str,
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: &'static [KeyEntry],
}

const NAVIGATION_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "j / ↓",
        description: "Move down",
    },
    KeyEntry {
        key: "k / ↑",
        description: "Move up",
    },
    KeyEntry {
        key: "g / Home",
        description: "Jump to first row",
    },
    KeyEntry {
        key: "G / End",
        description: "Jump to last row",
    },
    KeyEntry {
        key: "l / → / Enter",
        description: "Expand folder",
    },
    KeyEntry {
        key: "h / ←",
        description: "Collapse folder / go to parent",
    },
    KeyEntry {
        key: "Mouse click",
        description: "Select row",
    },
];

const SIZE_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "r",
        description: "Refresh size of selected row",
    },
    KeyEntry {
        key: "Click [Refresh]",
        description: "Refresh size of that folder",
    },
    KeyEntry {
        key: "s",
        description: "Cycle sort (name / size / modified)",
    },
    KeyEntry {
        key: "d",
        description: "Toggle folders first",
    },
];

const FILTER_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: "/ / Ctrl+F",
        description: "Focus search filter",
    },
    KeyEntry {
        key: "Enter",
        description: "Keep filter, back to tree",
    },
    KeyEntry {
        key: "Esc",
        description: "Clear filter",
    },
];

const GENERAL_KEYS: &[KeyEntry] = &[
    KeyEntry {
        key: ".",
        description: "Toggle hidden entries",
    },
    KeyEntry {
        key: "w",
        description: "Pause / resume watcher",
    },
    KeyEntry {
        key: "?",
        description: "Toggle this help",
    },
    KeyEntry {
        key: "q / Ctrl+C",
        description: "Quit",
    },
];

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: NAVIGATION_KEYS,
    },
    KeyCategory {
        name: "Sizes",
        entries: SIZE_KEYS,
    },
    KeyCategory {
        name: "Search",
        entries: FILTER_KEYS,
    },
    KeyCategory {
        name: "General",
        entries: GENERAL_KEYS,
    },
];

/// Help overlay widget showing all keybindings.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
    scroll_offset: usize,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors, scroll_offset: usize) -> Self {
        Self {
            theme,
            scroll_offset,
        }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        let header_style = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);

        lines.push(Line::from(Span::styled(" Keybinding Reference ", header_style)));
        lines.push(Line::from(""));

        for category in CATEGORIES {
            lines.push(Line::from(vec![
                Span::styled(format!("── {} ", category.name), header_style),
                Span::styled("─".repeat(30), Style::default().fg(self.theme.dim_fg)),
            ]));

            for entry in category.entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:<18}", entry.key),
                        Style::default()
                            .fg(self.theme.warning_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.description,
                        Style::default().fg(self.theme.tree_file_fg),
                    ),
                ]));
            }

            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(self.theme.dim_fg),
        )));

        lines
    }

    /// Total number of content lines (for scroll bounds).
    pub fn total_lines() -> usize {
        // title + blank + footer, then header + entries + blank per category
        3 + CATEGORIES
            .iter()
            .map(|c| c.entries.len() + 2)
            .sum::<usize>()
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let overlay_width = (area.width * 7 / 10).min(64);
        let overlay_height = (area.height * 8 / 10).min(40);
        let x = area.x + area.width.saturating_sub(overlay_width) / 2;
        let y = area.y + area.height.saturating_sub(overlay_height) / 2;
        let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg));
        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        let visible_height = inner.height as usize;
        for (i, line) in self
            .build_content_lines()
            .iter()
            .skip(self.scroll_offset)
            .take(visible_height)
            .enumerate()
        {
            buf.set_line(
                inner.x + 1,
                inner.y + i as u16,
                line,
                inner.width.saturating_sub(2),
            );
        }
    }
}
