use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode};
use crate::components::help::HelpOverlay;

/// Handle a key event according to the current mode.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        AppMode::Normal => handle_normal_key(app, key),
        AppMode::Filter => handle_filter_key(app, key),
        AppMode::Help => handle_help_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('r') => app.refresh_selected_size(),
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.enter_filter_mode()
        }
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Esc => {
            if !app.filter.text.is_empty() {
                app.clear_filter();
            }
        }
        KeyCode::Char('.') => app.toggle_hidden(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('d') => app.toggle_dirs_first(),
        KeyCode::Char('w') => app.toggle_watcher(),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
}

fn handle_filter_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Enter => app.exit_filter_mode(),
        KeyCode::Backspace => app.filter_delete_char(),
        KeyCode::Left => app.filter_cursor_left(),
        KeyCode::Right => app.filter_cursor_right(),
        KeyCode::Home => app.filter_cursor_home(),
        KeyCode::End => app.filter_cursor_end(),
        // Arrow keys still move through the filtered rows.
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            app.filter_input_char(c)
        }
        _ => {}
    }
}

fn handle_help_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => app.toggle_help(),
        KeyCode::Char('j') | KeyCode::Down => app.help_scroll_down(HelpOverlay::total_lines()),
        KeyCode::Char('k') | KeyCode::Up => app.help_scroll_up(),
        _ => {}
    }
}

/// Handle a mouse event: clicks select rows or press refresh buttons, the
/// wheel moves the selection.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode == AppMode::Help {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_previous(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crossterm::event::KeyEventKind;
    use ratatui::layout::Rect;
    use std::fs;
    use tempfile::TempDir;

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("report.txt"), vec![0u8; 10]).unwrap();
        let app = App::new(dir.path(), &AppConfig::default()).unwrap();
        (dir, app)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn q_quits_in_normal_mode() {
        let (_dir, mut app) = setup_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let (_dir, mut app) = setup_app();
        app.enter_filter_mode();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_keys_move_selection() {
        let (_dir, mut app) = setup_app();
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.tree_state.selected_index, 1);
        press(&mut app, KeyCode::End);
        assert_eq!(app.tree_state.selected_index, 2);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.tree_state.selected_index, 1);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.tree_state.selected_index, 0);
    }

    #[test]
    fn r_refreshes_selected_folder() {
        let (dir, mut app) = setup_app();
        press(&mut app, KeyCode::Down);
        fs::write(dir.path().join("alpha").join("big"), vec![0u8; 4096]).unwrap();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.tree_state.flat_items[1].size, "4 KB");
    }

    #[test]
    fn slash_then_typing_filters_and_q_is_text() {
        let (_dir, mut app) = setup_app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, AppMode::Filter);
        for c in "rep".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.filter.text, "repq");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.tree_state.flat_items.len(), 2);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.tree_state.is_filtering);
        press(&mut app, KeyCode::Esc);
        assert!(!app.tree_state.is_filtering);
        assert_eq!(app.tree_state.flat_items.len(), 3);
    }

    #[test]
    fn ctrl_f_focuses_filter() {
        let (_dir, mut app) = setup_app();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL),
        );
        assert_eq!(app.mode, AppMode::Filter);
    }

    #[test]
    fn control_chords_do_not_type_into_filter() {
        let (_dir, mut app) = setup_app();
        press(&mut app, KeyCode::Char('/'));
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL),
        );
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT));
        assert_eq!(app.mode, AppMode::Filter);
        assert_eq!(app.filter.text, "");
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert_eq!(app.filter.text, "A");
    }

    #[test]
    fn help_mode_swallows_keys() {
        let (_dir, mut app) = setup_app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.tree_state.selected_index, 0);
        assert_eq!(app.help_scroll, 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn mouse_click_on_refresh_button() {
        let (dir, mut app) = setup_app();
        app.tree_area = Rect::new(0, 0, 60, 10);
        fs::write(dir.path().join("alpha").join("x"), vec![0u8; 1024]).unwrap();
        handle_mouse_event(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 55, 1));
        assert_eq!(app.tree_state.selected_index, 1);
        assert_eq!(app.tree_state.flat_items[1].size, "1 KB");
    }

    #[test]
    fn mouse_wheel_moves_selection() {
        let (_dir, mut app) = setup_app();
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollDown, 0, 0));
        assert_eq!(app.tree_state.selected_index, 1);
        handle_mouse_event(&mut app, mouse(MouseEventKind::ScrollUp, 0, 0));
        assert_eq!(app.tree_state.selected_index, 0);
    }

    #[test]
    fn key_event_kind_is_press_by_default() {
        let key = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
        assert_eq!(key.kind, KeyEventKind::Press);
    }
}
