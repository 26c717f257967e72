//! The parameter panel: numeric fields, the character list and focus.

use crate::config::Theme;
use crate::widgets::text_input::TextInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    Modulus,
    Character,
    Start,
    End,
    RealPart,
    CltStart,
    CltEnd,
    Samples,
    Chart,
}

impl Focus {
    pub const ORDER: [Focus; 9] = [
        Focus::Modulus,
        Focus::Character,
        Focus::Start,
        Focus::End,
        Focus::RealPart,
        Focus::CltStart,
        Focus::CltEnd,
        Focus::Samples,
        Focus::Chart,
    ];

    /// Focus lands in a free-text field.
    pub fn is_text_entry(self) -> bool {
        !matches!(self, Focus::Character | Focus::Chart)
    }

    /// Global shortcuts stay live here even though it is a text field.
    pub fn allows_shortcuts(self) -> bool {
        !self.is_text_entry() || matches!(self, Focus::Modulus | Focus::End)
    }

    pub fn label(self) -> &'static str {
        match self {
            Focus::Modulus => "Modulus q",
            Focus::Character => "Character",
            Focus::Start => "Start t",
            Focus::End => "End t",
            Focus::RealPart => "Re(s)",
            Focus::CltStart => "CLT start",
            Focus::CltEnd => "CLT end",
            Focus::Samples => "Samples",
            Focus::Chart => "Chart",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Text shown in each field, kept in sync with the app state.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValues {
    pub modulus: u64,
    pub start: f64,
    pub end: f64,
    pub real_part: f64,
    pub clt_start: f64,
    pub clt_end: f64,
    pub samples: usize,
}

pub struct ParameterPanel {
    modulus: TextInput,
    start: TextInput,
    end: TextInput,
    real_part: TextInput,
    clt_start: TextInput,
    clt_end: TextInput,
    samples: TextInput,
    focus: Focus,
}

impl ParameterPanel {
    pub fn new(theme: &Theme) -> Self {
        let input = || TextInput::new().with_theme(theme);
        let mut panel = Self {
            modulus: input(),
            start: input(),
            end: input(),
            real_part: input(),
            clt_start: input(),
            clt_end: input(),
            samples: input(),
            focus: Focus::Chart,
        };
        panel.set_focus(Focus::Chart);
        panel
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        for f in Focus::ORDER {
            if let Some(input) = self.input_mut(f) {
                input.set_focused(f == focus);
            }
        }
    }

    pub fn input(&self, field: Focus) -> Option<&TextInput> {
        match field {
            Focus::Modulus => Some(&self.modulus),
            Focus::Start => Some(&self.start),
            Focus::End => Some(&self.end),
            Focus::RealPart => Some(&self.real_part),
            Focus::CltStart => Some(&self.clt_start),
            Focus::CltEnd => Some(&self.clt_end),
            Focus::Samples => Some(&self.samples),
            Focus::Character | Focus::Chart => None,
        }
    }

    pub fn input_mut(&mut self, field: Focus) -> Option<&mut TextInput> {
        match field {
            Focus::Modulus => Some(&mut self.modulus),
            Focus::Start => Some(&mut self.start),
            Focus::End => Some(&mut self.end),
            Focus::RealPart => Some(&mut self.real_part),
            Focus::CltStart => Some(&mut self.clt_start),
            Focus::CltEnd => Some(&mut self.clt_end),
            Focus::Samples => Some(&mut self.samples),
            Focus::Character | Focus::Chart => None,
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        self.input_mut(self.focus)
    }

    pub fn value(&self, field: Focus) -> &str {
        self.input(field).map(TextInput::value).unwrap_or("")
    }

    /// Overwrite every field with the current parameters.
    pub fn sync(&mut self, values: &FieldValues) {
        self.modulus.set_value(values.modulus.to_string());
        self.start.set_value(values.start.to_string());
        self.end.set_value(values.end.to_string());
        self.real_part.set_value(values.real_part.to_string());
        self.clt_start.set_value(values.clt_start.to_string());
        self.clt_end.set_value(values.clt_end.to_string());
        self.samples.set_value(values.samples.to_string());
    }
}

/// Parse a bound typed by the user. Unparsable or non-finite text is rejected.
pub fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
