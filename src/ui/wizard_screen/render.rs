//! Wizard screen rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::WizardScreen;
use crate::ui::dialogs::centered_rect;

/// Rows used by one field: label, input, inline error
const FIELD_HEIGHT: u16 = 3;

impl WizardScreen {
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let block = Block::default()
            .title(format!(" {} ", self.session.definition().name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Step header
                Constraint::Min(3),    // Fields or summary
                Constraint::Length(2), // Footer
            ])
            .split(inner);

        self.render_header(frame, chunks[0]);
        if self.step().fields.is_empty() {
            self.render_summary(frame, chunks[1]);
        } else {
            self.render_fields(frame, chunks[1]);
        }
        self.render_footer(frame, chunks[2]);

        if let Some(message) = &self.alert {
            render_alert(frame, message);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let step = self.step();
        let navigator = self.session.navigator();
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("Step {} of {}  ", navigator.position() + 1, navigator.step_count()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(
                step.title.as_str(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];
        if let Some(description) = &step.description {
            lines.push(Line::from(Span::styled(
                description.as_str(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_fields(&self, frame: &mut Frame, area: Rect) {
        let specs = &self.step().fields;
        let mut constraints: Vec<Constraint> = specs
            .iter()
            .map(|_| Constraint::Length(FIELD_HEIGHT))
            .collect();
        constraints.push(Constraint::Min(0));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (index, (spec, widget)) in specs.iter().zip(&self.widgets).enumerate() {
            let focused = index == self.focus;
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(rows[index]);

            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Yellow)
            };
            let label = Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(spec.display_label().to_string(), label_style),
            ]);
            frame.render_widget(Paragraph::new(label), parts[0]);

            let input_area = Rect {
                x: parts[1].x + 2,
                width: parts[1].width.saturating_sub(2),
                ..parts[1]
            };
            widget.render(frame, input_area, spec, self.form.options(&spec.name), focused);

            if let Some(message) = self.form.error_for(&spec.name) {
                let error = Paragraph::new(Line::from(Span::styled(
                    format!("  {}", message),
                    Style::default().fg(Color::Red),
                )));
                frame.render_widget(error, parts[2]);
            }
        }
    }

    /// Read-only review of everything answered so far
    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let answers = self.session.store().read();
        let mut lines = vec![
            Line::from(Span::styled(
                "Please review your answers:",
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
        ];
        for key in answers.sorted_keys() {
            let value = answers.get(key).map(ToString::to_string).unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", key), Style::default().fg(Color::Yellow)),
                Span::styled(value, Style::default().fg(Color::White)),
            ]));
        }
        if answers.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No answers yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let enter = if self.session.is_terminal() {
            "Submit"
        } else {
            "Next"
        };
        let mut spans = vec![
            Span::styled("[Enter]", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}  ", enter)),
            Span::styled("[Esc]", Style::default().fg(Color::Cyan)),
            Span::raw(" Back  "),
            Span::styled("[Tab]", Style::default().fg(Color::Cyan)),
            Span::raw(" Field  "),
            Span::styled("[^R]", Style::default().fg(Color::Cyan)),
            Span::raw(" Reload  "),
            Span::styled("[^C]", Style::default().fg(Color::Cyan)),
            Span::raw(" Quit"),
        ];
        if let Some(status) = &self.status {
            spans.push(Span::styled(
                format!("   {}", status),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Dismiss  [^R] Reload step",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
