use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " r:refresh  /:search  ?:help  q:quit ";

/// Status bar: selected path, row info and key hints, or a transient message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    watcher_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            info,
            theme,
            status_message: None,
            watcher_status: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str) -> Self {
        self.status_message = Some(msg);
        self
    }

    pub fn watcher_status(mut self, status: &'a str) -> Self {
        self.watcher_status = Some(status);
        self
    }
}

/// Keep the last `budget` characters of `s`, marking the cut with "...".
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        buf.set_style(
            Rect::new(area.x, area.y, area.width, 1),
            Style::default().bg(self.theme.status_bg),
        );

        if let Some(msg) = self.status_message {
            let line = Line::from(Span::styled(
                msg,
                Style::default()
                    .fg(self.theme.success_fg)
                    .bg(self.theme.status_bg),
            ));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let watcher = self.watcher_status.unwrap_or("");
        let right_len = self.info.chars().count()
            + watcher.chars().count()
            + KEY_HINTS.chars().count()
            + 2;
        let path_budget = width.saturating_sub(right_len);
        let path_display = truncate_left(self.path_str, path_budget);
        let gap = path_budget.saturating_sub(path_display.chars().count());

        let spans = vec![
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(self.info, Style::default().fg(self.theme.info_fg)),
            Span::raw(" "),
            Span::styled(
                watcher,
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ];

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::style::Color;

    fn render_row(widget: StatusBarWidget<'_>, width: u16) -> (Buffer, String) {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let content = (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        (buf, content)
    }

    #[test]
    fn test_status_message_replaces_bar() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("/path", "info", &tc).status_message("docs: 12 KB");
        let (buf, content) = render_row(widget, 80);
        assert!(content.contains("docs: 12 KB"));
        assert!(!content.contains("q:quit"));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Rgb(166, 227, 161));
    }

    #[test]
    fn test_normal_bar_rendering() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("/home/user/project", "Sort: Name", &tc)
            .watcher_status("[watching]");
        let (_, content) = render_row(widget, 100);
        assert!(content.contains("/home/user/project"));
        assert!(content.contains("Sort: Name"));
        assert!(content.contains("[watching]"));
        assert!(content.contains("r:refresh"));
    }

    #[test]
    fn test_long_path_truncated_from_left() {
        let tc = theme::dark_theme();
        let path = "/very/long/path/that/does/not/fit/anywhere/in/the/bar/leaf";
        let widget = StatusBarWidget::new(path, "Sort: Name", &tc);
        let (_, content) = render_row(widget, 70);
        assert!(content.starts_with("..."));
        assert!(content.contains("leaf"));
    }

    #[test]
    fn test_truncate_left_multibyte() {
        assert_eq!(truncate_left("/données/été", 8), "...s/été");
        assert_eq!(truncate_left("short", 10), "short");
        assert_eq!(truncate_left("abcdef", 2), "ab");
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("/path", "info", &tc);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
