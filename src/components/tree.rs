use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::fs::tree::{FlatItem, NodeType, TreeState};
use crate::theme::ThemeColors;

/// Label of the per-folder refresh button.
pub const REFRESH_LABEL: &str = "[Refresh]";
/// Width of the refresh button column, including a leading gap.
pub const REFRESH_COLUMN_WIDTH: u16 = 10;
/// Width of the right-aligned size column, including a leading gap.
pub const SIZE_COLUMN_WIDTH: u16 = 12;
/// Narrowest tree area that still gets size and button columns.
pub const MIN_COLUMNS_WIDTH: u16 = SIZE_COLUMN_WIDTH + REFRESH_COLUMN_WIDTH + 10;
/// Width of the type column, including a leading gap.
pub const TYPE_COLUMN_WIDTH: u16 = 12;
/// Width of the date-modified column, including a leading gap.
pub const MODIFIED_COLUMN_WIDTH: u16 = 18;
/// Narrowest tree area that also gets type and date-modified columns.
pub const MIN_DETAIL_WIDTH: u16 =
    MIN_COLUMNS_WIDTH + TYPE_COLUMN_WIDTH + MODIFIED_COLUMN_WIDTH + 10;

/// Marker drawn after the name of a symlink.
const LINK_MARKER: &str = "@";

/// Tree widget: name column with box-drawing guides, size, type and
/// date-modified columns, and a refresh button on folder rows.
pub struct TreeWidget<'a> {
    tree_state: &'a TreeState,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree_state: &'a TreeState, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            tree_state,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Build the indentation prefix using box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor is a last sibling.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 1..item.depth {
            let ancestor_is_last = items[..item_index]
                .iter()
                .rev()
                .take_while(|it| it.depth >= d)
                .find(|it| it.depth == d)
                .is_some_and(|it| it.is_last_sibling);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        if self.use_icons {
            match item.node_type {
                NodeType::Directory if item.is_expanded => "\u{f07c} ",
                NodeType::Directory => "\u{f07b} ",
                NodeType::Symlink => "\u{f0c1} ",
                NodeType::File => "\u{f15b} ",
            }
        } else {
            match item.node_type {
                NodeType::Directory if item.is_expanded => "[-] ",
                NodeType::Directory => "[+] ",
                NodeType::Symlink => "[L] ",
                NodeType::File => "    ",
            }
        }
    }

    fn name_style(&self, item: &FlatItem) -> Style {
        if item.is_hidden {
            Style::default().fg(self.theme.tree_hidden_fg)
        } else {
            match item.node_type {
                NodeType::Directory => Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD),
                NodeType::Symlink => Style::default().fg(self.theme.info_fg),
                NodeType::File => Style::default().fg(self.theme.tree_file_fg),
            }
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let items = &self.tree_state.flat_items;
        let visible_height = inner_area.height as usize;
        if items.is_empty() || visible_height == 0 {
            return;
        }

        let with_columns = inner_area.width >= MIN_COLUMNS_WIDTH;
        let with_details = inner_area.width >= MIN_DETAIL_WIDTH;
        let name_width = if with_details {
            inner_area.width
                - SIZE_COLUMN_WIDTH
                - TYPE_COLUMN_WIDTH
                - MODIFIED_COLUMN_WIDTH
                - REFRESH_COLUMN_WIDTH
        } else if with_columns {
            inner_area.width - SIZE_COLUMN_WIDTH - REFRESH_COLUMN_WIDTH
        } else {
            inner_area.width
        };
        let selected = self.tree_state.selected_index;
        let scroll = self.tree_state.scroll_offset;

        for (i, (idx, item)) in items
            .iter()
            .enumerate()
            .skip(scroll)
            .take(visible_height)
            .enumerate()
        {
            let y = inner_area.y + i as u16;
            let is_selected = idx == selected;

            let selected_style = Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);

            if is_selected {
                buf.set_style(Rect::new(inner_area.x, y, inner_area.width, 1), selected_style);
            }

            let prefix = Self::build_prefix(item, items, idx);
            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::raw(self.item_indicator(item)),
                Span::styled(item.name.as_str(), self.name_style(item)),
            ];
            if item.is_symlink {
                spans.push(Span::styled(LINK_MARKER, Style::default().fg(self.theme.info_fg)));
            }
            let name_line = Line::from(spans);
            let name_line = if is_selected {
                name_line.patch_style(selected_style)
            } else {
                name_line
            };
            buf.set_line(inner_area.x, y, &name_line, name_width);

            if !with_columns {
                continue;
            }

            let size_x = inner_area.x + name_width;
            let size_text = format!("{:>width$}", item.size, width = SIZE_COLUMN_WIDTH as usize);
            let size_style = if is_selected {
                selected_style
            } else {
                Style::default().fg(self.theme.size_fg)
            };
            buf.set_stringn(size_x, y, size_text, SIZE_COLUMN_WIDTH as usize, size_style);

            let mut next_x = size_x + SIZE_COLUMN_WIDTH;
            if with_details {
                let detail_style = if is_selected {
                    selected_style
                } else {
                    Style::default().fg(self.theme.dim_fg)
                };
                // Left-aligned after a one-cell gap.
                buf.set_stringn(
                    next_x + 1,
                    y,
                    &item.kind,
                    (TYPE_COLUMN_WIDTH - 1) as usize,
                    detail_style,
                );
                next_x += TYPE_COLUMN_WIDTH;
                buf.set_stringn(
                    next_x + 1,
                    y,
                    &item.modified,
                    (MODIFIED_COLUMN_WIDTH - 1) as usize,
                    detail_style,
                );
                next_x += MODIFIED_COLUMN_WIDTH;
            }

            if item.node_type == NodeType::Directory {
                let button_x = next_x + 1;
                let button_style = Style::default()
                    .fg(self.theme.button_fg)
                    .add_modifier(Modifier::BOLD);
                buf.set_stringn(
                    button_x,
                    y,
                    REFRESH_LABEL,
                    (REFRESH_COLUMN_WIDTH - 1) as usize,
                    button_style,
                );
            }
        }
    }
}
