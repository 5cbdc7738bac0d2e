//! On-screen keyboard showing which keys are held

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use crate::synth::Key;

/// Columns per white key
const KEY_WIDTH: u16 = 4;

/// Two-row piano layout: black keys on top, white keys below
pub struct Keyboard<'a> {
    active: &'a [Key],
    block: Option<Block<'a>>,
}

impl<'a> Keyboard<'a> {
    pub fn new(active: &'a [Key]) -> Self {
        Self {
            active,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Column and row of a key relative to the widget origin
    fn position(key: Key) -> (u16, u16) {
        let whites_before = Key::all()
            .take_while(|&k| k != key)
            .filter(|k| !k.is_sharp())
            .count() as u16;
        if key.is_sharp() {
            (whites_before * KEY_WIDTH - KEY_WIDTH / 2, 0)
        } else {
            (whites_before * KEY_WIDTH, 1)
        }
    }

    fn style(&self, key: Key) -> Style {
        let base = if key.is_sharp() {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        };
        if self.active.contains(&key) {
            base.bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            base
        }
    }

    fn render_keys(&self, area: Rect, buf: &mut Buffer) {
        for key in Key::all() {
            let (dx, dy) = Self::position(key);
            if dx + 3 > area.width || dy >= area.height {
                continue;
            }
            buf.set_string(area.x + dx, area.y + dy, format!(" {} ", key), self.style(key));
        }
    }
}

impl Widget for Keyboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        self.render_keys(inner_area, buf);
    }
}
