use crossterm::event::{KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

/// Counters shown on the debug line when `--debug` is set.
#[derive(Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub last_key: Option<String>,
    pub requests_issued: u64,
    pub stale_dropped: u64,
    pub live_charts: usize,
}

impl DebugState {
    pub fn on_key(&mut self, event: &KeyEvent) {
        let mut key = String::new();
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            key.push_str("C-");
        }
        if event.modifiers.contains(KeyModifiers::ALT) {
            key.push_str("A-");
        }
        if event.modifiers.contains(KeyModifiers::SHIFT) {
            key.push_str("S-");
        }
        key.push_str(&event.code.to_string());
        self.last_key = Some(key);
    }

    pub fn line(&self) -> String {
        format!(
            "events: {}  frames: {}  key: {}  requests: {}  stale: {}  charts: {}",
            self.num_events,
            self.num_frames,
            self.last_key.as_deref().unwrap_or("-"),
            self.requests_issued,
            self.stale_dropped,
            self.live_charts,
        )
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.line())
            .style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .render(area, buf);
    }
}
