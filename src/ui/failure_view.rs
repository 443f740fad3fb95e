//! Failed task: the reason and everything logged up to the failure.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::state::Task;
use crate::ui::{LogView, Theme};

pub struct FailureView;

impl FailureView {
    pub fn render(frame: &mut Frame, area: Rect, task: &Task, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let reason = task.error().unwrap_or("The analysis failed.");
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("Analysis of {} failed", task.url().unwrap_or("the website")),
                    theme.error_style,
                )),
                Line::from(Span::styled(reason.to_string(), theme.normal_text)),
            ])
            .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let logs: Vec<&str> = task.logs().collect();
        LogView::render(frame, chunks[1], "Log", &logs, theme);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("r", theme.key_style),
                Span::raw(" try again  "),
                Span::styled("q", theme.key_style),
                Span::raw(" quit"),
            ]))
            .style(theme.help_style),
            chunks[2],
        );
    }
}
