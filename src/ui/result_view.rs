//! Summary of a completed analysis.
//!
//! The report itself is left to the service's own viewers; this view shows
//! the brand summary and where to fetch the generated resources.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::state::{Payload, Task};
use crate::ui::{format_elapsed, Theme};

pub struct ResultView;

impl ResultView {
    pub fn render(frame: &mut Frame, area: Rect, task: &Task, base_url: &str, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(1)])
            .split(area);

        let mut lines = Vec::new();
        if let Some(payload) = task.payload() {
            lines.extend(summary_lines(payload, theme));
            lines.push(Line::from(""));
            lines.extend(link_lines(payload, base_url, theme));
        }
        if let Some(elapsed) = task.finished_at().and_then(|at| task.elapsed(at)) {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Finished in ", theme.label_style),
                Span::styled(format_elapsed(elapsed), theme.value_style),
            ]));
        }

        let title = format!("Analysis complete: {}", task.url().unwrap_or_default());
        let body = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(title, theme.completed_style))
                    .borders(Borders::ALL),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[0]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("n", theme.key_style),
                Span::raw(" analyze another  "),
                Span::styled("q", theme.key_style),
                Span::raw(" quit"),
            ]))
            .style(theme.help_style),
            chunks[1],
        );
    }
}

fn summary_lines<'a>(payload: &'a Payload, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    if let Some(title) = payload.title() {
        lines.push(Line::from(Span::styled(title, theme.header_style)));
    }
    if let Some(description) = payload.description() {
        lines.push(Line::from(Span::styled(description, theme.normal_text)));
    }
    let fonts = payload.fonts();
    if !fonts.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Fonts: ", theme.label_style),
            Span::styled(fonts.join(", "), theme.value_style),
        ]));
    }
    if let Some(report) = payload.report() {
        let words = report.split_whitespace().count();
        lines.push(Line::from(vec![
            Span::styled("Report: ", theme.label_style),
            Span::styled(format!("{words} words"), theme.value_style),
        ]));
    }
    lines
}

fn link_lines(payload: &Payload, base_url: &str, theme: &Theme) -> Vec<Line<'static>> {
    let links = payload.links(base_url);
    if links.is_empty() {
        return vec![Line::from(Span::styled("No downloadable resources.", theme.help_style))];
    }

    let labelled = |label: &str, url: String| {
        Line::from(vec![
            Span::styled(format!("{label:<12}"), theme.label_style),
            Span::styled(url, theme.link_style),
        ])
    };

    let mut lines = Vec::new();
    if let Some(report) = links.report {
        lines.push(labelled("Report", report));
    }
    if let Some(snapshot) = links.snapshot {
        lines.push(labelled("Screenshot", snapshot));
    }
    for asset in links.assets {
        lines.push(labelled("Asset", asset));
    }
    for stylesheet in links.stylesheets {
        lines.push(labelled("Stylesheet", stylesheet));
    }
    lines
}
