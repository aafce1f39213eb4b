//! Single-line terminal prompts.
//!
//! Renders an inline `label: value` line below the cursor, optionally masking
//! the value, without taking over the screen. When stdin isn't a terminal the
//! answer is read as a plain line instead.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal, TerminalOptions, Viewport,
};
use std::io::{self, BufRead, Write};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Result of a prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum PromptResult {
    /// User pressed Enter.
    Submitted(String),
    /// User cancelled (Escape or Ctrl+C).
    Cancelled,
}

/// Ask for a password, echoing `*` for each character.
pub fn password(label: &str) -> Result<PromptResult> {
    run(label, true)
}

/// Ask for a line of text.
pub fn line(label: &str) -> Result<PromptResult> {
    run(label, false)
}

fn run(label: &str, masked: bool) -> Result<PromptResult> {
    if !atty::is(atty::Stream::Stdin) {
        return read_plain_line(label);
    }

    enable_raw_mode()?;
    let result = run_inline(label, masked);
    disable_raw_mode()?;
    println!();

    result
}

fn read_plain_line(label: &str) -> Result<PromptResult> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut buf = String::new();
    if io::stdin().lock().read_line(&mut buf)? == 0 {
        return Ok(PromptResult::Cancelled);
    }
    Ok(PromptResult::Submitted(buf.trim_end_matches(['\r', '\n']).to_string()))
}

fn run_inline(label: &str, masked: bool) -> Result<PromptResult> {
    let backend = CrosstermBackend::new(io::stderr());
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(1),
        },
    )?;
    input_loop(&mut terminal, label, masked)
}

fn input_loop<B: Backend>(terminal: &mut Terminal<B>, label: &str, masked: bool) -> Result<PromptResult> {
    let mut input = Input::default();

    loop {
        terminal.draw(|frame| draw_prompt(frame, label, &input, masked))?;

        if let Event::Key(key) = event::read()? {
            if let Some(result) = handle_key(&mut input, key) {
                return Ok(result);
            }
        }
    }
}

/// Apply one key press; returns a result once the prompt is finished.
fn handle_key(input: &mut Input, key: KeyEvent) -> Option<PromptResult> {
    // Only handle key press events (not release)
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Enter => Some(PromptResult::Submitted(input.value().to_string())),
        KeyCode::Esc => Some(PromptResult::Cancelled),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(PromptResult::Cancelled)
        }
        _ => {
            input.handle_event(&Event::Key(key));
            None
        }
    }
}

/// Draw `label` followed by the (possibly masked) value.
fn draw_prompt(frame: &mut Frame, label: &str, input: &Input, masked: bool) {
    let area = frame.area();
    let label_width = label.chars().count() as u16;
    let input_width = area.width.saturating_sub(label_width).max(1) as usize;

    let value: String = if masked {
        "*".repeat(input.value().chars().count())
    } else {
        input.value().to_string()
    };
    let cursor_pos = input.visual_cursor();

    // Scroll the input if cursor is beyond visible area
    let scroll = if cursor_pos >= input_width {
        cursor_pos - input_width + 1
    } else {
        0
    };
    let visible_value: String = value.chars().skip(scroll).take(input_width).collect();

    let line = Line::from(vec![
        Span::styled(
            label.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(visible_value),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let cursor_x = area.x + label_width + (cursor_pos - scroll) as u16;
    frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
}
