//! Waveform widget for ratatui

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

/// Master output drawn as a min/max envelope, one column per bucket
pub struct Waveform<'a> {
    samples: &'a [f32],
    style: Style,
    block: Option<Block<'a>>,
}

impl<'a> Waveform<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self {
            samples,
            style: Style::default(),
            block: None,
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Lowest and highest sample of column `x` out of `width`
    fn column_range(&self, x: usize, width: usize) -> (f32, f32) {
        let len = self.samples.len();
        let start = x * len / width;
        let end = ((x + 1) * len / width).max(start + 1).min(len);
        self.samples[start.min(len - 1)..end]
            .iter()
            .fold((0.0f32, 0.0f32), |(lo, hi), &s| (lo.min(s), hi.max(s)))
    }

    fn render_waveform(&self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 || self.samples.is_empty() {
            return;
        }

        let width = area.width as usize;
        let half = (area.height.saturating_sub(1) / 2) as f32;
        let center_y = area.y + area.height.saturating_sub(1) / 2;
        let bottom = area.y + area.height - 1;

        for x in 0..width {
            let (lo, hi) = self.column_range(x, width);
            let top = center_y.saturating_sub((hi.clamp(0.0, 1.0) * half).round() as u16);
            let low = (center_y + (-lo.clamp(-1.0, 0.0) * half).round() as u16).min(bottom);

            let screen_x = area.x + x as u16;
            if top == low {
                buf.set_string(screen_x, center_y, "─", Style::default());
            } else {
                for y in top.max(area.y)..=low {
                    buf.set_string(screen_x, y, "│", self.style);
                }
            }
        }
    }
}

impl Widget for Waveform<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_waveform(inner_area, buf);
    }
}
