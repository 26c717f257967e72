//! Info panel: the current parameters, the last point evaluation, the
//! histogram summary and the last error.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Row, Table, Widget};

use crate::backend::PointValue;

pub fn format_point(point: &PointValue) -> String {
    format!(
        "L({} + {}i) = {} (q={})",
        point.s_real, point.s_imag, point.result, point.modulus
    )
}

pub struct InfoPanel<'a> {
    pub rows: Vec<(&'static str, String)>,
    pub error: Option<&'a str>,
    pub border: Color,
    pub label: Color,
    pub error_color: Color,
}

impl Widget for &InfoPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border))
            .padding(Padding::horizontal(1))
            .title(" Info ");

        let mut rows: Vec<Row> = self
            .rows
            .iter()
            .map(|(k, v)| {
                Row::new(vec![
                    Line::from(Span::styled(*k, Style::default().fg(self.label))),
                    Line::from(v.as_str()),
                ])
            })
            .collect();
        if let Some(err) = self.error {
            rows.push(Row::new(vec![
                Line::from(Span::styled(
                    "Error",
                    Style::default()
                        .fg(self.error_color)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(err, Style::default().fg(self.error_color))),
            ]));
        }

        Table::new(rows, [Constraint::Length(10), Constraint::Fill(1)])
            .block(block)
            .render(area, buf);
    }
}
