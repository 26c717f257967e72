use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

const DEFAULT_CONTROLS: [(&str, &str); 8] = [
    ("Tab", "Field"),
    ("v", "View"),
    ("r", "Refresh"),
    ("S-Esc", "Reset zoom"),
    ("e", "Export"),
    ("p", "Point"),
    ("i", "Info"),
    ("q", "Quit"),
];

/// Keybind hints along the bottom of the screen, with a short status on the
/// right.
pub struct Controls {
    pub status: Option<String>,
    pub status_color: Option<Color>,
    pub dimmed: bool,
    custom: Option<Vec<(&'static str, &'static str)>>,
    bg: Color,
    key_color: Color,
    label_color: Color,
    dim_color: Color,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            status: None,
            status_color: None,
            dimmed: false,
            custom: None,
            bg: Color::DarkGray,
            key_color: Color::Cyan,
            label_color: Color::White,
            dim_color: Color::DarkGray,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Status text in its own color, e.g. for errors.
    pub fn with_status_color(mut self, color: Color) -> Self {
        self.status_color = Some(color);
        self
    }

    pub fn with_dimmed(mut self, dimmed: bool, dim_color: Color) -> Self {
        self.dimmed = dimmed;
        self.dim_color = dim_color;
        self
    }

    pub fn with_colors(mut self, bg: Color, key_color: Color, label_color: Color) -> Self {
        self.bg = bg;
        self.key_color = key_color;
        self.label_color = label_color;
        self
    }

    /// Replace the default hints, e.g. while a text field has focus.
    pub fn with_custom_controls(mut self, controls: Vec<(&'static str, &'static str)>) -> Self {
        self.custom = Some(controls);
        self
    }

    fn controls(&self) -> Vec<(&'static str, &'static str)> {
        self.custom
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTROLS.to_vec())
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let controls = self.controls();
        let mut constraints = controls.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        let status_width = self
            .status
            .as_ref()
            .map(|s| s.chars().count() as u16 + 2)
            .unwrap_or(0);
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(status_width));

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let (key_style, label_style) = if self.dimmed {
            let dim = Style::default().fg(self.dim_color);
            (dim.bold(), dim.bg(self.bg))
        } else {
            (
                Style::default().fg(self.key_color).bold(),
                Style::default().fg(self.label_color).bg(self.bg),
            )
        };

        for (i, (key, action)) in controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(key_style)
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[j + 1], buf);
        }

        let fill = controls.len() * 2;
        Paragraph::new("")
            .style(Style::default().bg(self.bg))
            .render(layout[fill], buf);
        if let Some(status) = &self.status {
            let style = match self.status_color {
                Some(color) => label_style.fg(color),
                None => label_style,
            };
            Paragraph::new(format!("{} ", status))
                .style(style)
                .right_aligned()
                .render(layout[fill + 1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &Buffer, width: u16) -> String {
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_default_hints_render() {
        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        Controls::new().with_status("loading").render(area, &mut buf);
        let text = row_text(&buf, 120);
        assert!(text.contains("Tab"));
        assert!(text.contains("Refresh"));
        assert!(text.trim_end().ends_with("loading"));
    }

    #[test]
    fn test_custom_hints_replace_defaults() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        Controls::new()
            .with_custom_controls(vec![("Enter", "Apply"), ("Esc", "Leave")])
            .render(area, &mut buf);
        let text = row_text(&buf, 60);
        assert!(text.contains("Apply"));
        assert!(!text.contains("Refresh"));
    }
}
