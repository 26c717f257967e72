use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::config::Theme;

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit, // Enter pressed
    Cancel, // Esc pressed
    Changed,
}

/// Single-line numeric entry wrapping tui-textarea
pub struct TextInput {
    textarea: TextArea<'static>,
    value: String,
    text_color: Option<Color>,
    focused: bool,
}

/// Characters that can appear in a decimal or scientific number.
fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

impl TextInput {
    pub fn new() -> Self {
        let mut widget = Self {
            textarea: TextArea::default(),
            value: String::new(),
            text_color: None,
            focused: false,
        };
        widget.apply_style();
        widget
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.apply_style();
        self
    }

    fn apply_style(&mut self) {
        let mut style = Style::default();
        if let Some(color) = self.text_color {
            style = style.fg(color);
        }
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        let cursor = if self.focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            // same style as the text hides the cursor
            style
        };
        self.textarea.set_cursor_style(cursor);
    }

    fn sync_from_textarea(&mut self) {
        self.value = self.textarea.lines().first().cloned().unwrap_or_default();
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_style();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and put the cursor at the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into().replace(['\n', '\r'], " ");
        self.textarea = TextArea::new(vec![self.value.clone()]);
        self.apply_style();
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> TextInputEvent {
        match event.code {
            KeyCode::Enter => TextInputEvent::Submit,
            KeyCode::Esc => TextInputEvent::Cancel,
            KeyCode::Char(c) if !is_numeric_char(c) => TextInputEvent::None,
            KeyCode::Up | KeyCode::Down | KeyCode::Tab | KeyCode::BackTab => TextInputEvent::None,
            _ => {
                let input = key_event_to_input(event);
                if self.textarea.input(input) {
                    self.sync_from_textarea();
                    TextInputEvent::Changed
                } else {
                    TextInputEvent::None
                }
            }
        }
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
fn key_event_to_input(event: &KeyEvent) -> Input {
    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => Key::Null,
    };

    Input {
        key,
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        // tui-textarea underlines the cursor line
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let style = cell.style().remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_set_value() {
        let mut input = TextInput::new();
        input.set_value("100");
        assert_eq!(input.value(), "100");
        input.clear();
        assert!(input.is_empty());
    }

    #[test]
    fn test_typing_appends_at_cursor() {
        let mut input = TextInput::new();
        input.set_value("10");
        assert_eq!(input.handle_key(&key(KeyCode::Char('5'))), TextInputEvent::Changed);
        assert_eq!(input.value(), "105");
        input.handle_key(&key(KeyCode::Backspace));
        input.handle_key(&key(KeyCode::Backspace));
        assert_eq!(input.value(), "1");
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut input = TextInput::new();
        input.set_value("7");
        assert_eq!(input.handle_key(&key(KeyCode::Char('x'))), TextInputEvent::None);
        assert_eq!(input.value(), "7");
        input.handle_key(&key(KeyCode::Char('.')));
        input.handle_key(&key(KeyCode::Char('5')));
        assert_eq!(input.value(), "7.5");
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = TextInput::new();
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc)), TextInputEvent::Cancel);
    }
}
