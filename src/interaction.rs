//! Keyboard and pointer input mapped to console actions.

use crate::chart_lifecycle::ChartInstance;
use crate::form::Focus;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    ResetZoom,
    ZoomTo(f64),
    /// Change the modulus by this amount.
    ModulusStep(i64),
    /// Move the end bound by this many configured steps.
    EndStep(i8),
    /// Move the character selection forward or back.
    CharacterStep(i8),
    FocusNext,
    FocusPrev,
    /// Leave the current field without applying it.
    Blur,
    Submit,
    CycleView { forward: bool },
    Refresh,
    Export,
    EvaluatePoint,
    ToggleInfo,
    Quit,
}

impl Action {
    /// Actions that change a query parameter and so need a fresh fetch.
    pub fn refetches(&self) -> bool {
        matches!(
            self,
            Action::ResetZoom
                | Action::ZoomTo(_)
                | Action::ModulusStep(_)
                | Action::EndStep(_)
                | Action::CharacterStep(_)
                | Action::CycleView { .. }
                | Action::Refresh
        )
    }
}

/// Map a key press to an action, given where focus is.
///
/// `None` means the key belongs to the focused text field.
pub fn map_key(event: &KeyEvent, focus: Focus) -> Option<Action> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let shift = event.modifiers.contains(KeyModifiers::SHIFT);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

    match event.code {
        KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::Tab => return Some(Action::FocusNext),
        KeyCode::BackTab => return Some(Action::FocusPrev),
        _ => {}
    }

    if focus.allows_shortcuts() {
        let shortcut = match event.code {
            KeyCode::Esc if shift => Some(Action::ResetZoom),
            KeyCode::Up if shift => Some(Action::ModulusStep(1)),
            KeyCode::Down if shift => Some(Action::ModulusStep(-1)),
            KeyCode::Right if shift => Some(Action::EndStep(1)),
            KeyCode::Left if shift => Some(Action::EndStep(-1)),
            KeyCode::Up if alt => Some(Action::CharacterStep(1)),
            KeyCode::Down if alt => Some(Action::CharacterStep(-1)),
            _ => None,
        };
        if shortcut.is_some() {
            return shortcut;
        }
    }

    if focus.is_text_entry() {
        return match event.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Esc => Some(Action::Blur),
            _ => None,
        };
    }

    match event.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('v') => Some(Action::CycleView { forward: true }),
        KeyCode::Char('V') => Some(Action::CycleView { forward: false }),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('e') => Some(Action::Export),
        KeyCode::Char('p') => Some(Action::EvaluatePoint),
        KeyCode::Char('i') => Some(Action::ToggleInfo),
        KeyCode::Up if focus == Focus::Character => Some(Action::CharacterStep(-1)),
        KeyCode::Down if focus == Focus::Character => Some(Action::CharacterStep(1)),
        KeyCode::Enter if focus == Focus::Character => Some(Action::Refresh),
        _ => None,
    }
}

/// Translate a click on `instance` into the x of the nearest data point.
///
/// Only charts that allow click zoom respond. The hit test is by x alone,
/// so any click inside the plot area picks a point when there is data.
pub fn resolve_click(instance: &ChartInstance, column: u16, row: u16) -> Option<f64> {
    if !instance.spec.options.zoom_on_click {
        return None;
    }
    let geometry = instance.geometry?;
    if row < geometry.area.y || row >= geometry.area.bottom() {
        return None;
    }
    let x = geometry.column_to_x(column)?;
    let (_, (px, _)) = instance.spec.nearest_point(x)?;
    Some(px)
}
