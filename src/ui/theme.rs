//! UI theme definition.

use ratatui::style::{Color, Modifier, Style};

use crate::state::TaskStatus;

/// Theme for the application UI.
#[derive(Debug, Clone)]
pub struct Theme {
    // Basic styles
    pub normal_text: Style,
    pub block_style: Style,
    pub header_style: Style,
    pub label_style: Style,
    pub value_style: Style,
    pub link_style: Style,
    pub input_style: Style,

    // Status line
    pub error_style: Style,
    pub help_style: Style,
    pub key_style: Style,

    // Task status styles
    pub idle_style: Style,
    pub processing_style: Style,
    pub completed_style: Style,
    pub failed_style: Style,

    // Log terminal
    pub log_style: Style,
    pub latest_log_style: Style,

    // Progress bar
    pub progress_style: Style,
    pub progress_empty_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            normal_text: Style::default().fg(Color::White),
            block_style: Style::default(),
            header_style: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            label_style: Style::default().fg(Color::Gray),
            value_style: Style::default().fg(Color::White),
            link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            input_style: Style::default().fg(Color::Yellow),

            error_style: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            help_style: Style::default().fg(Color::Gray),
            key_style: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),

            idle_style: Style::default().fg(Color::Gray),
            processing_style: Style::default().fg(Color::Yellow),
            completed_style: Style::default().fg(Color::Green),
            failed_style: Style::default().fg(Color::Red),

            log_style: Style::default().fg(Color::Green),
            latest_log_style: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),

            progress_style: Style::default().fg(Color::Cyan),
            progress_empty_style: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Style for a task status label.
    pub fn status_style(&self, status: TaskStatus) -> Style {
        match status {
            TaskStatus::Idle => self.idle_style,
            TaskStatus::Processing => self.processing_style,
            TaskStatus::Completed => self.completed_style,
            TaskStatus::Failed => self.failed_style,
        }
    }
}
