use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::config::Theme;
use crate::form::{Focus, ParameterPanel};
use crate::residues::CharacterSelector;
use lscan_cli::ViewMode;

/// Fields shown above the character list, in display order.
const SCAN_FIELDS: [Focus; 4] = [Focus::Modulus, Focus::Start, Focus::End, Focus::RealPart];
const CLT_FIELDS: [Focus; 3] = [Focus::CltStart, Focus::CltEnd, Focus::Samples];

const LABEL_WIDTH: u16 = 11;

/// Left-hand parameter column.
pub struct ParamsView<'a> {
    pub panel: &'a ParameterPanel,
    pub selector: &'a CharacterSelector,
    pub view: ViewMode,
    pub loading: bool,
    pub theme: &'a Theme,
}

impl ParamsView<'_> {
    fn render_field(&self, field: Focus, area: Rect, buf: &mut Buffer) {
        let focused = self.panel.focus() == field;
        let label_style = if focused {
            Style::default()
                .fg(self.theme.get("border_active"))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.get("text_secondary"))
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LABEL_WIDTH), Constraint::Fill(1)])
            .split(area);
        Paragraph::new(field.label())
            .style(label_style)
            .render(cols[0], buf);
        if let Some(input) = self.panel.input(field) {
            input.render(cols[1], buf);
        }
    }

    fn render_characters(&self, area: Rect, buf: &mut Buffer) {
        let focused = self.panel.focus() == Focus::Character;
        let border = if focused {
            self.theme.get("border_active")
        } else {
            self.theme.get("border")
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(
                " Characters mod {} ({}) ",
                self.selector.modulus(),
                self.selector.len()
            ));
        let items: Vec<ListItem> = self
            .selector
            .residues()
            .iter()
            .map(|r| ListItem::new(format!("Chi {}", r.label())))
            .collect();
        let list = List::new(items)
            .block(block)
            .style(Style::default().fg(self.theme.get("text_primary")))
            .highlight_style(
                Style::default()
                    .fg(self.theme.get("secondary"))
                    .add_modifier(Modifier::REVERSED),
            );
        let mut state = ListState::default();
        state.select(self.selector.selected().checked_sub(1));
        StatefulWidget::render(list, area, buf, &mut state);
    }
}

impl Widget for &ParamsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("border")))
            .title(" Parameters ");
        let inner = block.inner(area);
        block.render(area, buf);

        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(SCAN_FIELDS.iter().map(|_| Constraint::Length(1)));
        constraints.push(Constraint::Fill(1));
        constraints.extend(CLT_FIELDS.iter().map(|_| Constraint::Length(1)));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let mut header = vec![
            Span::styled("View ", Style::default().fg(self.theme.get("text_secondary"))),
            Span::styled(
                self.view.as_str(),
                Style::default()
                    .fg(self.theme.get("primary"))
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if self.loading {
            header.push(Span::styled(
                "  loading...",
                Style::default().fg(self.theme.get("loading")),
            ));
        }
        Paragraph::new(Line::from(header)).render(rows[0], buf);

        for (i, field) in SCAN_FIELDS.iter().enumerate() {
            self.render_field(*field, rows[1 + i], buf);
        }
        let list_row = 1 + SCAN_FIELDS.len();
        self.render_characters(rows[list_row], buf);
        for (i, field) in CLT_FIELDS.iter().enumerate() {
            self.render_field(*field, rows[list_row + 1 + i], buf);
        }
    }
}
