//! URL prompt shown while no task is tracked.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

const PROMPT: &str = "URL: ";

/// Input form for the website to analyze.
pub struct InputView;

impl InputView {
    pub fn render(frame: &mut Frame, area: Rect, input: &str, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let block = Block::default()
            .title("Analyze a website")
            .borders(Borders::ALL)
            .style(theme.block_style);
        let inner = block.inner(chunks[0]);

        let prompt = Paragraph::new(Line::from(vec![
            Span::styled(PROMPT, theme.label_style),
            Span::styled(input.to_string(), theme.input_style),
        ]))
        .block(block);
        frame.render_widget(prompt, chunks[0]);

        if let Some(x) = cursor_column(inner, input) {
            frame.set_cursor(x, inner.y);
        }

        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::raw("Enter a website, e.g. "),
                Span::styled("example.com", theme.value_style),
                Span::raw(". "),
                Span::styled("https://", theme.value_style),
                Span::raw(" is added when no scheme is given."),
            ]),
            Line::from(vec![
                Span::styled("Enter", theme.key_style),
                Span::raw(" analyze  "),
                Span::styled("Esc", theme.key_style),
                Span::raw(" quit  "),
                Span::styled("F1", theme.key_style),
                Span::raw(" help"),
            ]),
        ])
        .style(theme.help_style)
        .wrap(Wrap { trim: true });
        frame.render_widget(hint, chunks[1]);
    }
}

/// Column just past the typed text, or `None` once it runs off the box.
fn cursor_column(inner: Rect, input: &str) -> Option<u16> {
    let offset = u16::try_from(PROMPT.width().saturating_add(input.width())).ok()?;
    let x = inner.x.checked_add(offset)?;
    (x < inner.right()).then_some(x)
}
