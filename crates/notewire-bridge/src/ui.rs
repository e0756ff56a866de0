//! TUI rendering
//!
//! Three panes: a status block (serial line, MIDI device, input mode),
//! a compact two-row key strip highlighting held keys, and the activity
//! log rendered newest-first with timestamps.

use crate::config::Theme;
use crate::keyboard::{Keyboard, BINDINGS};
use crate::logger::LogEntry;
use log::Level;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::collections::VecDeque;

/// How many log entries the activity buffer retains
pub const LOG_CAPACITY: usize = 200;

/// Everything the renderer needs for one frame
pub struct UiState<'a> {
    pub keyboard: &'a Keyboard,
    pub log: &'a VecDeque<LogEntry>,
    pub sink_name: &'a str,
    pub line_label: &'a str,
    pub midi_device: Option<&'a str>,
    pub os_keyboard_active: bool,
    pub theme: &'a Theme,
}

/// Push a log entry, dropping the oldest past capacity
pub fn push_log(log: &mut VecDeque<LogEntry>, entry: LogEntry) {
    log.push_front(entry);
    log.truncate(LOG_CAPACITY);
}

/// Render the full UI
pub fn render(frame: &mut Frame, state: &UiState) {
    let key_strip_height = if state.theme.show_keys { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(key_strip_height),
            Constraint::Min(3),
        ])
        .split(frame.area());

    render_status(frame, chunks[0], state);
    if state.theme.show_keys {
        render_key_strip(frame, chunks[1], state);
    }
    render_log(frame, chunks[2], state);
}

fn render_status(frame: &mut Frame, area: Rect, state: &UiState) {
    let input_mode = if state.os_keyboard_active { "OS" } else { "Terminal" };
    let midi = state.midi_device.unwrap_or("not connected");

    let lines = vec![
        Line::from(vec![
            Span::styled("Serial: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{} ({})", state.sink_name, state.line_label)),
        ]),
        Line::from(vec![
            Span::styled("MIDI:   ", Style::default().fg(Color::DarkGray)),
            Span::raw(midi.to_string()),
            Span::styled("   Keys: ", Style::default().fg(Color::DarkGray)),
            Span::raw(input_mode.to_string()),
        ]),
    ];

    let block = Block::default()
        .title(" notewire ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.border()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_key_strip(frame: &mut Frame, area: Rect, state: &UiState) {
    let lines = vec![
        key_row(state, 1), // upper rows, channel 1
        key_row(state, 0), // lower rows, channel 0
    ];

    let block = Block::default()
        .title(" keys ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.border()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One row of the strip: the keys of a channel in table order
fn key_row(state: &UiState, channel: u8) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" ch{} ", channel),
        Style::default().fg(Color::DarkGray),
    )];

    for binding in BINDINGS.iter().filter(|b| b.channel == channel) {
        let display = binding.key.to_ascii_uppercase();
        let style = if state.keyboard.is_held(binding.key) {
            Style::default()
                .fg(Color::Black)
                .bg(state.theme.pressed_key())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(state.theme.key())
        };
        spans.push(Span::styled(format!(" {} ", display), style));
    }

    Line::from(spans)
}

fn render_log(frame: &mut Frame, area: Rect, state: &UiState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .log
        .iter()
        .take(visible)
        .map(|entry| {
            let style = match entry.level {
                Level::Error => Style::default().fg(Color::Red),
                Level::Warn => Style::default().fg(Color::Yellow),
                _ => Style::default(),
            };
            Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), style),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" activity ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.border()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::Keyboard;
    use crate::config::Theme;

    #[test]
    fn test_key_rows_split_by_channel() {
        let keyboard = Keyboard::default();
        let log = VecDeque::new();
        let theme = Theme::default();
        let state = UiState {
            keyboard: &keyboard,
            log: &log,
            sink_name: "/dev/ttyUSB0",
            line_label: "38400 8N1",
            midi_device: None,
            os_keyboard_active: false,
            theme: &theme,
        };

        // label span + one span per key of the channel
        assert_eq!(key_row(&state, 0).spans.len(), 1 + 18);
        assert_eq!(key_row(&state, 1).spans.len(), 1 + 20);
    }

    #[test]
    fn test_push_log_caps_buffer() {
        let mut log = VecDeque::new();
        for i in 0..(LOG_CAPACITY + 10) {
            push_log(
                &mut log,
                LogEntry {
                    level: Level::Info,
                    timestamp: chrono::Local::now(),
                    message: format!("entry {}", i),
                },
            );
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        // Newest first
        assert_eq!(log[0].message, format!("entry {}", LOG_CAPACITY + 9));
    }
}
