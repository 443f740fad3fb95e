//! Help overlay showing keyboard shortcuts.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::ui::Theme;

/// Help overlay showing keyboard shortcuts and usage information.
pub struct HelpView;

const SHORTCUTS: &[(&str, &str, &str)] = &[
    ("Enter", "Start the analysis", "prompt"),
    ("Backspace", "Delete a character", "prompt"),
    ("Ctrl+U", "Clear the URL", "prompt"),
    ("c", "Cancel and return to the prompt", "processing"),
    ("n", "Analyze another website", "completed"),
    ("r", "Try again with the same URL", "failed"),
    ("q / Esc", "Quit (Esc only at the prompt)", "anywhere"),
    ("Ctrl+C", "Quit", "anywhere"),
    ("F1 / ?", "Toggle this help screen", "anywhere"),
];

impl HelpView {
    pub fn render(frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);

        let help_block = Block::default()
            .title("Analysis TUI Help")
            .borders(Borders::ALL)
            .style(theme.block_style);

        let mut help_text = vec![
            Line::from(Span::styled(
                "Keyboard Shortcuts",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        help_text.extend(SHORTCUTS.iter().map(|(key, action, scope)| {
            Line::from(vec![
                Span::styled(format!("{key:<10}"), theme.key_style),
                Span::raw(format!(" {action}")),
                Span::styled(format!(" ({scope})"), theme.help_style),
            ])
        }));

        let help_widget = Paragraph::new(help_text)
            .block(help_block)
            .style(theme.normal_text)
            .alignment(Alignment::Left);

        frame.render_widget(help_widget, popup_area);
    }
}

/// Rect centered in `r`, sized as a percentage of it.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let scale = |len: u16, percent: u16| (u32::from(len) * u32::from(percent.min(100)) / 100) as u16;
    let popup_width = scale(r.width, percent_x);
    let popup_height = scale(r.height, percent_y);

    Rect {
        x: r.x + (r.width - popup_width) / 2,
        y: r.y + (r.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    }
}
