//! Scrolling log terminal for a task's progress messages.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::ui::Theme;

/// View showing the newest log lines that fit, latest highlighted.
pub struct LogView;

impl LogView {
    pub fn render(frame: &mut Frame, area: Rect, title: &str, logs: &[&str], theme: &Theme) {
        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .style(theme.block_style);

        let height = block.inner(area).height as usize;
        let visible = visible_tail(logs, height);
        let last = visible.len().saturating_sub(1);

        let lines: Vec<Line> = visible
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == last {
                    theme.latest_log_style
                } else {
                    theme.log_style
                };
                Line::from(vec![
                    Span::styled("> ", theme.label_style),
                    Span::styled(entry.to_string(), style),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// The last `height` entries, so the newest line is always on screen.
pub fn visible_tail<'a, 'b>(logs: &'b [&'a str], height: usize) -> &'b [&'a str] {
    &logs[logs.len().saturating_sub(height)..]
}
