//! Live view of a task being processed.

use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::state::Task;
use crate::ui::widgets::ProgressBar;
use crate::ui::{format_elapsed, LogView, Theme};

pub struct ProgressView;

impl ProgressView {
    pub fn render(frame: &mut Frame, area: Rect, task: &Task, now: DateTime<Utc>, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let url = task.url().unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Analyzing ", theme.label_style),
                Span::styled(url.to_string(), theme.value_style),
            ])),
            chunks[0],
        );

        let bar = ProgressBar::new(task.progress())
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .style(theme.progress_style)
            .empty_style(theme.progress_empty_style);
        frame.render_widget(bar, chunks[1]);

        let mut status = vec![Span::styled("Elapsed ", theme.label_style)];
        status.push(Span::styled(
            task.elapsed(now).map(format_elapsed).unwrap_or_default(),
            theme.value_style,
        ));
        if task.id().is_none() {
            status.push(Span::styled("  waiting for the service...", theme.help_style));
        }
        frame.render_widget(Paragraph::new(Line::from(status)), chunks[2]);

        let logs: Vec<&str> = task.logs().collect();
        LogView::render(frame, chunks[3], "Log", &logs, theme);
    }
}
