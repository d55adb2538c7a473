use std::path::{Path, PathBuf};
use std::time::Instant;

use ratatui::layout::Rect;

use crate::components::tree::{MIN_COLUMNS_WIDTH, REFRESH_COLUMN_WIDTH};
use crate::config::AppConfig;
use crate::error::Result;
use crate::fs::tree::{NodeType, SortBy, TreeState};
use crate::fs::watcher::affected_dirs;
use crate::theme::{resolve_theme, ThemeColors};

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Keystrokes edit the filter text.
    Filter,
    /// Keybinding overlay.
    Help,
}

/// Text input state of the filter line edit.
#[derive(Debug, Default)]
pub struct FilterInput {
    pub text: String,
    /// Byte offset of the cursor in `text`.
    pub cursor_position: usize,
}

/// What a mouse click on the tree landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row(usize),
    RefreshButton(usize),
}

/// Main application state.
pub struct App {
    pub tree_state: TreeState,
    pub should_quit: bool,
    pub mode: AppMode,
    pub filter: FilterInput,
    pub status_message: Option<(String, Instant)>,
    /// Whether watcher events are being forwarded.
    pub watcher_active: bool,
    /// Whether a watcher exists at all (`-w` or a start failure turn it off).
    pub watcher_available: bool,
    pub use_icons: bool,
    pub theme: ThemeColors,
    pub help_scroll: usize,
    /// Inner area of the tree panel from the last draw, for mouse hit tests.
    pub tree_area: Rect,
}

impl App {
    /// Create a new App rooted at the given path.
    pub fn new(path: &Path, config: &AppConfig) -> Result<Self> {
        let mut tree_state = TreeState::new(path)?;
        tree_state.show_hidden = config.show_hidden();
        tree_state.sort_by = SortBy::from_config(config.sort_by());
        tree_state.dirs_first = config.dirs_first();
        tree_state.sort_all_children();
        tree_state.flatten();

        Ok(Self {
            tree_state,
            should_quit: false,
            mode: AppMode::Normal,
            filter: FilterInput::default(),
            status_message: None,
            watcher_active: config.watcher_enabled(),
            watcher_available: config.watcher_enabled(),
            use_icons: config.use_icons(),
            theme: resolve_theme(&config.theme),
            help_scroll: 0,
            tree_area: Rect::default(),
        })
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.tree_state.flat_items.len();
        if len > 0 && self.tree_state.selected_index < len - 1 {
            self.tree_state.selected_index += 1;
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if self.tree_state.selected_index > 0 {
            self.tree_state.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.tree_state.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.tree_state.flat_items.len();
        if len > 0 {
            self.tree_state.selected_index = len - 1;
        }
    }

    /// Expand the selected directory (or no-op on files).
    pub fn expand_selected(&mut self) {
        self.tree_state.expand_selected();
    }

    /// Collapse the selected directory, or jump to parent.
    pub fn collapse_selected(&mut self) {
        self.tree_state.collapse_selected();
    }

    pub fn toggle_hidden(&mut self) {
        self.with_selection_kept(TreeState::toggle_hidden);
        let state = if self.tree_state.show_hidden {
            "shown"
        } else {
            "hidden"
        };
        self.set_status_message(format!("Hidden entries {}", state));
    }

    pub fn cycle_sort(&mut self) {
        self.with_selection_kept(TreeState::cycle_sort);
        self.set_status_message(format!("Sort: {}", self.tree_state.sort_by.label()));
    }

    pub fn toggle_dirs_first(&mut self) {
        self.with_selection_kept(TreeState::toggle_dirs_first);
        let state = if self.tree_state.dirs_first {
            "on"
        } else {
            "off"
        };
        self.set_status_message(format!("Folders first: {}", state));
    }

    /// Run a tree mutation and re-select the previously selected path if it
    /// is still visible.
    fn with_selection_kept(&mut self, f: impl FnOnce(&mut TreeState)) {
        let selected = self.selected_path();
        f(&mut self.tree_state);
        if let Some(i) = selected.and_then(|p| self.tree_state.find_index_by_path(&p)) {
            self.tree_state.selected_index = i;
        }
    }

    fn selected_path(&self) -> Option<PathBuf> {
        self.tree_state.selected_item().map(|item| item.path.clone())
    }

    // ── Size refresh ────────────────────────────────────────────────────────

    /// Recompute the size of the selected row and report it.
    pub fn refresh_selected_size(&mut self) {
        self.refresh_row(self.tree_state.selected_index);
    }

    /// Recompute the size of the row at `index`, selecting it.
    pub fn refresh_row(&mut self, index: usize) {
        let Some(item) = self.tree_state.flat_items.get(index) else {
            return;
        };
        let path = item.path.clone();
        let name = item.name.clone();
        self.tree_state.selected_index = index;

        match self.tree_state.refresh_size_of(&path) {
            Some(result) => {
                tracing::info!(path = %result.path.display(), bytes = result.size_bytes, "folder size refreshed");
                self.set_status_message(format!("{}: {}", name, result.display()));
            }
            None => {
                let size = self
                    .tree_state
                    .find_index_by_path(&path)
                    .map(|i| self.tree_state.flat_items[i].size.clone())
                    .unwrap_or_default();
                self.set_status_message(format!("{}: {}", name, size));
            }
        }
        if let Some(i) = self.tree_state.find_index_by_path(&path) {
            self.tree_state.selected_index = i;
        }
    }

    // ── Filter line edit ────────────────────────────────────────────────────

    /// Focus the filter line edit.
    pub fn enter_filter_mode(&mut self) {
        self.filter.cursor_position = self.filter.text.len();
        self.mode = AppMode::Filter;
    }

    /// Leave the filter line edit, keeping the filter applied.
    pub fn exit_filter_mode(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Clear the filter text and restore the full tree.
    pub fn clear_filter(&mut self) {
        self.filter = FilterInput::default();
        self.mode = AppMode::Normal;
        self.apply_filter_text();
    }

    /// Insert a character at the cursor; the filter updates immediately.
    pub fn filter_input_char(&mut self, c: char) {
        self.filter.text.insert(self.filter.cursor_position, c);
        self.filter.cursor_position += c.len_utf8();
        self.apply_filter_text();
    }

    /// Delete the character before the cursor (backspace).
    pub fn filter_delete_char(&mut self) {
        if let Some(prev) = self.filter.text[..self.filter.cursor_position]
            .chars()
            .next_back()
        {
            self.filter.cursor_position -= prev.len_utf8();
            self.filter.text.remove(self.filter.cursor_position);
            self.apply_filter_text();
        }
    }

    pub fn filter_cursor_left(&mut self) {
        if let Some(prev) = self.filter.text[..self.filter.cursor_position]
            .chars()
            .next_back()
        {
            self.filter.cursor_position -= prev.len_utf8();
        }
    }

    pub fn filter_cursor_right(&mut self) {
        if let Some(next) = self.filter.text[self.filter.cursor_position..].chars().next() {
            self.filter.cursor_position += next.len_utf8();
        }
    }

    pub fn filter_cursor_home(&mut self) {
        self.filter.cursor_position = 0;
    }

    pub fn filter_cursor_end(&mut self) {
        self.filter.cursor_position = self.filter.text.len();
    }

    fn apply_filter_text(&mut self) {
        let text = self.filter.text.clone();
        self.with_selection_kept(|tree| tree.set_filter(&text));
    }

    // ── Help overlay ────────────────────────────────────────────────────────

    pub fn toggle_help(&mut self) {
        self.mode = if self.mode == AppMode::Help {
            AppMode::Normal
        } else {
            self.help_scroll = 0;
            AppMode::Help
        };
    }

    pub fn help_scroll_down(&mut self, total_lines: usize) {
        if self.help_scroll + 1 < total_lines {
            self.help_scroll += 1;
        }
    }

    pub fn help_scroll_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    // ── Watcher ─────────────────────────────────────────────────────────────

    /// Pause or resume watcher event forwarding.
    pub fn toggle_watcher(&mut self) {
        if !self.watcher_available {
            self.set_status_message("Watcher disabled".to_string());
            return;
        }
        self.watcher_active = !self.watcher_active;
        let msg = if self.watcher_active {
            "Watcher resumed"
        } else {
            "Watcher paused"
        };
        self.set_status_message(msg.to_string());
    }

    /// Mark the watcher as unavailable, with the reason in the status bar.
    pub fn watcher_failed(&mut self, reason: String) {
        self.watcher_available = false;
        self.watcher_active = false;
        self.set_status_message(format!("⚠ Watcher unavailable: {}", reason));
    }

    /// Reload the folders touched by a batch of filesystem changes.
    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        if !self.watcher_active {
            return;
        }
        let root = self.tree_state.root.path.clone();
        if paths.iter().any(|p| *p == root) {
            // A flood collapses to the root alone; the changed folders are unknown.
            tracing::debug!(changed = paths.len(), "reloading whole tree");
            self.with_selection_kept(|tree| tree.reload_tree());
            return;
        }
        let dirs = affected_dirs(&paths, &root);
        tracing::debug!(changed = paths.len(), dirs = dirs.len(), "filesystem change");
        self.with_selection_kept(|tree| {
            for dir in &dirs {
                tree.reload_dir(dir);
            }
        });
    }

    // ── Mouse ───────────────────────────────────────────────────────────────

    /// Map a terminal cell to a tree row or its refresh button.
    pub fn click_target(&self, column: u16, row: u16) -> Option<ClickTarget> {
        let area = self.tree_area;
        if column < area.x
            || column >= area.x + area.width
            || row < area.y
            || row >= area.y + area.height
        {
            return None;
        }
        let index = self.tree_state.scroll_offset + (row - area.y) as usize;
        let item = self.tree_state.flat_items.get(index)?;
        let button_start = (area.x + area.width).saturating_sub(REFRESH_COLUMN_WIDTH);
        let has_button = item.node_type == NodeType::Directory && area.width >= MIN_COLUMNS_WIDTH;
        if has_button && column >= button_start {
            Some(ClickTarget::RefreshButton(index))
        } else {
            Some(ClickTarget::Row(index))
        }
    }

    /// Handle a left click at a terminal cell.
    pub fn click(&mut self, column: u16, row: u16) {
        match self.click_target(column, row) {
            Some(ClickTarget::RefreshButton(index)) => self.refresh_row(index),
            Some(ClickTarget::Row(index)) => self.tree_state.selected_index = index,
            None => {}
        }
    }
}
