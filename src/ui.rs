use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::filter_bar::FilterBarWidget;
use crate::components::help::HelpOverlay;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI: filter bar, tree and status bar.
pub fn render(app: &mut App, frame: &mut Frame) {
    app.clear_expired_status();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let filter_bar = FilterBarWidget::new(&app.filter, &app.theme, app.mode == AppMode::Filter)
        .match_count(app.tree_state.flat_items.len().saturating_sub(1));
    frame.render_widget(filter_bar, chunks[0]);

    let block = Block::default()
        .title(format!(" {} ", app.tree_state.root.name))
        .title_bottom(format!(" {} ", app.tree_state.sort_by.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.mode == AppMode::Normal {
            app.theme.border_focused_fg
        } else {
            app.theme.border_fg
        }))
        .title_style(
            Style::default()
                .fg(app.theme.accent_fg)
                .add_modifier(Modifier::BOLD),
        );

    // Mouse hit tests use the area of this frame.
    app.tree_area = block.inner(chunks[1]);
    app.tree_state.update_scroll(app.tree_area.height as usize);

    let tree_widget = TreeWidget::new(&app.tree_state, &app.theme, app.use_icons).block(block);
    frame.render_widget(tree_widget, chunks[1]);

    let path_str = app
        .tree_state
        .selected_item()
        .map(|item| item.path.display().to_string())
        .unwrap_or_default();
    let info = format!("Sort: {}", app.tree_state.sort_by.label());
    let watcher_status = match (app.watcher_available, app.watcher_active) {
        (false, _) => None,
        (true, true) => Some("[watching]"),
        (true, false) => Some("[paused]"),
    };

    let mut status_bar = StatusBarWidget::new(&path_str, &info, &app.theme);
    if let Some(status) = watcher_status {
        status_bar = status_bar.watcher_status(status);
    }
    if let Some((msg, _)) = &app.status_message {
        status_bar = status_bar.status_message(msg);
    }
    frame.render_widget(status_bar, chunks[2]);

    if app.mode == AppMode::Help {
        frame.render_widget(HelpOverlay::new(&app.theme, app.help_scroll), frame.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;
    use std::fs;
    use tempfile::TempDir;

    fn draw(app: &mut App, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buf = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("music")).unwrap();
        fs::write(dir.path().join("music").join("track"), vec![0u8; 3072]).unwrap();
        let app = App::new(dir.path(), &AppConfig::default()).unwrap();
        (dir, app)
    }

    #[test]
    fn layout_has_filter_tree_and_status() {
        let (_dir, mut app) = setup_app();
        let lines = draw(&mut app, 80, 12);
        assert!(lines[1].contains("Search.."));
        assert!(lines[5].contains("music"));
        assert!(lines[5].contains("3 KB"));
        assert!(lines[5].contains("[Refresh]"));
        assert!(lines[11].contains("Sort: Name"));
        assert!(lines[11].contains("[watching]"));
    }

    #[test]
    fn render_records_tree_area() {
        let (_dir, mut app) = setup_app();
        draw(&mut app, 80, 12);
        assert_eq!(app.tree_area, Rect::new(1, 4, 78, 6));
    }

    #[test]
    fn help_overlay_drawn_in_help_mode() {
        let (_dir, mut app) = setup_app();
        app.toggle_help();
        let lines = draw(&mut app, 100, 40);
        assert!(lines.iter().any(|l| l.contains("Keybinding Reference")));
    }

    #[test]
    fn status_message_shown_after_refresh() {
        let (_dir, mut app) = setup_app();
        app.refresh_row(1);
        let lines = draw(&mut app, 80, 12);
        assert!(lines[11].contains("music: 3 KB"));
    }
}
