//! Input widgets for wizard fields

use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::wizard::{AnswerValue, FieldKind, FieldSpec, OptionSet};

/// Editing state of one field; the value itself also lives in the
/// step's controller, which is the source of truth for validation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWidget {
    /// Single-line text input, cursor counted in chars
    TextInput { value: String, cursor_pos: usize },
    /// Choice from the field's option set
    Select { selected: Option<String> },
    /// Boolean checkbox
    Checkbox { checked: bool },
}

impl FieldWidget {
    pub fn from_spec(spec: &FieldSpec, value: &AnswerValue) -> Self {
        let mut widget = match spec.kind {
            FieldKind::Text => FieldWidget::TextInput {
                value: String::new(),
                cursor_pos: 0,
            },
            FieldKind::Select => FieldWidget::Select { selected: None },
            FieldKind::Checkbox => FieldWidget::Checkbox { checked: false },
        };
        widget.sync_from(value);
        widget
    }

    /// Replace the editing state with `value`
    pub fn sync_from(&mut self, value: &AnswerValue) {
        match self {
            FieldWidget::TextInput {
                value: text,
                cursor_pos,
            } => {
                *text = value.as_text().unwrap_or_default().to_string();
                *cursor_pos = text.chars().count();
            }
            FieldWidget::Select { selected } => {
                *selected = value
                    .as_text()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
            }
            FieldWidget::Checkbox { checked } => {
                *checked = value.as_bool().unwrap_or(false);
            }
        }
    }

    /// The value to hand to the controller
    pub fn answer(&self) -> AnswerValue {
        match self {
            FieldWidget::TextInput { value, .. } => AnswerValue::Text(value.clone()),
            FieldWidget::Select { selected } => selected.clone().into(),
            FieldWidget::Checkbox { checked } => AnswerValue::Bool(*checked),
        }
    }

    /// Handle a key; returns true if the value changed
    pub fn handle_key(&mut self, key: KeyCode, options: Option<&OptionSet>) -> bool {
        match self {
            FieldWidget::TextInput { value, cursor_pos } => match key {
                KeyCode::Char(c) => {
                    let at = byte_index(value, *cursor_pos);
                    value.insert(at, c);
                    *cursor_pos += 1;
                    true
                }
                KeyCode::Backspace if *cursor_pos > 0 => {
                    *cursor_pos -= 1;
                    let at = byte_index(value, *cursor_pos);
                    value.remove(at);
                    true
                }
                KeyCode::Delete if *cursor_pos < value.chars().count() => {
                    let at = byte_index(value, *cursor_pos);
                    value.remove(at);
                    true
                }
                KeyCode::Left => {
                    *cursor_pos = cursor_pos.saturating_sub(1);
                    false
                }
                KeyCode::Right => {
                    *cursor_pos = (*cursor_pos + 1).min(value.chars().count());
                    false
                }
                KeyCode::Home => {
                    *cursor_pos = 0;
                    false
                }
                KeyCode::End => {
                    *cursor_pos = value.chars().count();
                    false
                }
                _ => false,
            },
            FieldWidget::Select { selected } => {
                let Some(values) = options.and_then(OptionSet::values) else {
                    return false;
                };
                if values.is_empty() {
                    return false;
                }
                let current = selected
                    .as_ref()
                    .and_then(|s| values.iter().position(|v| v == s));
                let len = values.len();
                let next = match (key, current) {
                    (KeyCode::Right | KeyCode::Char(' '), None) => 0,
                    (KeyCode::Left, None) => len - 1,
                    (KeyCode::Right | KeyCode::Char(' '), Some(i)) => (i + 1) % len,
                    (KeyCode::Left, Some(i)) => {
                        if i == 0 {
                            len - 1
                        } else {
                            i - 1
                        }
                    }
                    _ => return false,
                };
                *selected = Some(values[next].clone());
                true
            }
            FieldWidget::Checkbox { checked } => match key {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                    *checked = !*checked;
                    true
                }
                _ => false,
            },
        }
    }

    /// Render the input line of the field
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        spec: &FieldSpec,
        options: Option<&OptionSet>,
        focused: bool,
    ) {
        let value_style = Style::default().fg(if focused { Color::White } else { Color::Gray });
        let hint_style = Style::default().fg(Color::DarkGray);

        let line = match self {
            FieldWidget::TextInput { value, cursor_pos } => {
                if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        spec.placeholder.clone().unwrap_or_default(),
                        hint_style,
                    ))
                } else if focused {
                    let at = byte_index(value, *cursor_pos);
                    Line::from(vec![
                        Span::styled(&value[..at], value_style),
                        Span::styled("|", Style::default().fg(Color::Cyan)),
                        Span::styled(&value[at..], value_style),
                    ])
                } else {
                    Line::from(Span::styled(value.as_str(), value_style))
                }
            }
            FieldWidget::Select { selected } => select_line(
                selected.as_deref(),
                spec.placeholder.as_deref(),
                options.unwrap_or(&OptionSet::NotLoaded),
                value_style,
                focused,
            ),
            FieldWidget::Checkbox { checked } => {
                let mark = if *checked { "[x] " } else { "[ ] " };
                Line::from(vec![
                    Span::styled(mark, Style::default().fg(Color::Cyan)),
                    Span::styled(spec.display_label().to_string(), value_style),
                ])
            }
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Text shown for a select field in each option-set state
pub fn select_display(
    selected: Option<&str>,
    placeholder: Option<&str>,
    options: &OptionSet,
) -> String {
    match options {
        OptionSet::NotLoaded => "Loading...".to_string(),
        OptionSet::Failed(_) => "Options unavailable".to_string(),
        OptionSet::Loaded(values) if values.is_empty() => "No options available".to_string(),
        OptionSet::Loaded(_) => match selected {
            Some(value) => value.to_string(),
            None => placeholder.unwrap_or("Select an option").to_string(),
        },
    }
}

fn select_line<'a>(
    selected: Option<&str>,
    placeholder: Option<&str>,
    options: &OptionSet,
    value_style: Style,
    focused: bool,
) -> Line<'a> {
    let text = select_display(selected, placeholder, options);
    let style = if selected.is_some() && options.is_loaded() {
        value_style.add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    if focused && options.values().is_some_and(|v| !v.is_empty()) {
        Line::from(vec![
            Span::styled("< ", Style::default().fg(Color::Cyan)),
            Span::styled(text, style),
            Span::styled(" >", Style::default().fg(Color::Cyan)),
        ])
    } else {
        Line::from(Span::styled(text, style))
    }
}

fn byte_index(value: &str, char_pos: usize) -> usize {
    value
        .char_indices()
        .nth(char_pos)
        .map_or(value.len(), |(i, _)| i)
}
