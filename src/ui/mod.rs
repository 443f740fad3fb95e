//! UI components for the analysis TUI.
//!
//! The screen follows the tracked task: a URL prompt while idle, a progress
//! bar and log terminal while processing, a summary once completed and the
//! failure reason with its log after a failure. Key handling depends on the
//! same status; the UI never touches the task itself and instead reports an
//! [`UpdateKind`] for the application to act on.

pub mod failure_view;
pub mod help;
pub mod input_view;
pub mod log_view;
pub mod progress_view;
pub mod result_view;
pub mod theme;
pub mod widgets;

pub use failure_view::FailureView;
pub use help::HelpView;
pub use input_view::InputView;
pub use log_view::LogView;
pub use progress_view::ProgressView;
pub use result_view::ResultView;
pub use theme::Theme;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::{Task, TaskStatus};

/// The result of updating the UI in response to user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// Submit the entered URL
    Submit(String),
    /// Drop the current task and go back to the prompt
    Reset,
    /// Quit the application
    Quit,
    /// Toggle help overlay
    ToggleHelp,
    /// Other update (no action needed)
    Other,
}

/// Everything a frame needs besides the UI's own state.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub task: &'a Task,
    /// Root used to resolve result resource links.
    pub base_url: &'a str,
    /// Poll failures since the last successful poll.
    pub poll_failures: u32,
    pub now: DateTime<Utc>,
}

/// Main UI controller.
#[derive(Debug, Default)]
pub struct Ui {
    /// URL being typed at the prompt
    input: String,
    show_help: bool,
    theme: Theme,
}

impl Ui {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt pre-filled with `url`.
    pub fn with_input(url: impl Into<String>) -> Self {
        Self {
            input: url.into(),
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Handle keyboard input for the screen `task` is currently shown on.
    pub fn handle_key_event(&mut self, key: KeyEvent, task: &Task) -> UpdateKind {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Global shortcuts first
        match key.code {
            KeyCode::Char('c') if ctrl => return UpdateKind::Quit,
            KeyCode::F(1) => return UpdateKind::ToggleHelp,
            _ => {}
        }

        if self.show_help {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => UpdateKind::ToggleHelp,
                _ => UpdateKind::Other,
            };
        }

        match task.status() {
            TaskStatus::Idle => self.handle_prompt_input(key),
            TaskStatus::Processing => match key.code {
                KeyCode::Char('c') => UpdateKind::Reset,
                KeyCode::Char('q') | KeyCode::Esc => UpdateKind::Quit,
                KeyCode::Char('?') => UpdateKind::ToggleHelp,
                _ => UpdateKind::Other,
            },
            TaskStatus::Completed => match key.code {
                KeyCode::Char('n') | KeyCode::Enter => {
                    self.input.clear();
                    UpdateKind::Reset
                }
                KeyCode::Char('q') | KeyCode::Esc => UpdateKind::Quit,
                KeyCode::Char('?') => UpdateKind::ToggleHelp,
                _ => UpdateKind::Other,
            },
            TaskStatus::Failed => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => {
                    self.input = task.url().unwrap_or_default().to_string();
                    UpdateKind::Reset
                }
                KeyCode::Char('q') | KeyCode::Esc => UpdateKind::Quit,
                KeyCode::Char('?') => UpdateKind::ToggleHelp,
                _ => UpdateKind::Other,
            },
        }
    }

    fn handle_prompt_input(&mut self, key: KeyEvent) -> UpdateKind {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter => {
                if self.input.trim().is_empty() {
                    UpdateKind::Other
                } else {
                    UpdateKind::Submit(std::mem::take(&mut self.input))
                }
            }
            KeyCode::Esc => UpdateKind::Quit,
            KeyCode::Backspace => {
                self.input.pop();
                UpdateKind::Other
            }
            KeyCode::Char('u') if ctrl => {
                self.input.clear();
                UpdateKind::Other
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                UpdateKind::Other
            }
            _ => UpdateKind::Other,
        }
    }

    /// Render the UI.
    pub fn render(&self, frame: &mut Frame, ctx: &ViewContext<'_>) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let body = chunks[0];
        match ctx.task.status() {
            TaskStatus::Idle => InputView::render(frame, body, &self.input, &self.theme),
            TaskStatus::Processing => {
                ProgressView::render(frame, body, ctx.task, ctx.now, &self.theme)
            }
            TaskStatus::Completed => {
                ResultView::render(frame, body, ctx.task, ctx.base_url, &self.theme)
            }
            TaskStatus::Failed => FailureView::render(frame, body, ctx.task, &self.theme),
        }

        // Render help overlay if active (always on top)
        if self.show_help {
            HelpView::render(frame, body, &self.theme);
        }

        self.render_status_line(frame, chunks[1], ctx);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
        let status = ctx.task.status();
        let mut spans = vec![Span::styled(
            status.as_str().to_uppercase(),
            self.theme.status_style(status),
        )];

        if status.is_active() {
            spans.push(Span::raw(format!(" | {}%", ctx.task.progress())));
        }
        if ctx.poll_failures > 0 {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("service unreachable ({} failed checks)", ctx.poll_failures),
                self.theme.error_style,
            ));
        }
        spans.push(Span::styled(
            format!(" | {} | F1 for help", ctx.base_url),
            self.theme.help_style,
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Formats a duration as `42s`, `3m 07s` or `1h 02m`.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!("{}h {:02}m", secs / 3600, secs % 3600 / 60),
    }
}
