//! Task progress bar.
//!
//! Fills a percentage of the available width and overlays the percentage
//! (or a custom label) in the middle of the first row.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Progress bar for a task's 0-100 completion percentage.
pub struct ProgressBar<'a> {
    block: Option<Block<'a>>,
    /// Completion percentage, at most 100
    percent: u8,
    style: Style,
    empty_style: Style,
    symbol_filled: &'a str,
    symbol_empty: &'a str,
    label: Option<String>,
}

impl<'a> Default for ProgressBar<'a> {
    fn default() -> Self {
        Self {
            block: None,
            percent: 0,
            style: Style::default().fg(Color::Cyan),
            empty_style: Style::default().fg(Color::DarkGray),
            symbol_filled: "█",
            symbol_empty: "░",
            label: None,
        }
    }
}

impl<'a> ProgressBar<'a> {
    /// Create a progress bar; values above 100 are clamped.
    pub fn new(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
            ..Default::default()
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn empty_style(mut self, style: Style) -> Self {
        self.empty_style = style;
        self
    }

    /// Replace the percentage text with `label`.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Number of filled cells for a bar `width` cells wide.
    fn filled_width(&self, width: u16) -> u16 {
        (u32::from(width) * u32::from(self.percent) / 100) as u16
    }
}

impl<'a> Widget for ProgressBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let render_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        if render_area.width < 1 || render_area.height < 1 {
            return;
        }

        let filled = self.filled_width(render_area.width);
        let split = render_area.left().saturating_add(filled);

        for y in render_area.top()..render_area.bottom() {
            for x in render_area.left()..split {
                buf.get_mut(x, y)
                    .set_symbol(self.symbol_filled)
                    .set_style(self.style);
            }
            for x in split..render_area.right() {
                buf.get_mut(x, y)
                    .set_symbol(self.symbol_empty)
                    .set_style(self.empty_style);
            }
        }

        let text = self
            .label
            .clone()
            .unwrap_or_else(|| format!("{}%", self.percent));
        let text_width = text.width() as u16;
        if text_width >= render_area.width {
            return;
        }

        let text_x = render_area.left() + (render_area.width - text_width) / 2;
        let text_y = render_area.top();
        let text_style = Style::default()
            .fg(Color::Black)
            .bg(self.style.fg.unwrap_or(Color::Cyan));

        for (i, c) in text.chars().enumerate() {
            let x = text_x + i as u16;
            if x >= render_area.right() {
                break;
            }
            // Text over the empty part keeps the bar's dim background.
            let style = if x < split {
                text_style
            } else {
                Style::default().fg(Color::White)
            };
            buf.get_mut(x, text_y).set_char(c).set_style(style);
        }
    }
}
