//! Transport bar widget - buttons, tape counter, speed selector

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};
use reel_audio::ButtonStates;

pub struct TransportWidget<'a> {
    theme: &'a Theme,
    buttons: ButtonStates,
    readout: &'a str,
    selected_rate: f64,
}

impl<'a> TransportWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            buttons: ButtonStates::default(),
            readout: "",
            selected_rate: 1.0,
        }
    }

    pub fn buttons(mut self, buttons: ButtonStates) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn readout(mut self, readout: &'a str) -> Self {
        self.readout = readout;
        self
    }

    pub fn selected_rate(mut self, rate: f64) -> Self {
        self.selected_rate = rate;
        self
    }

    fn draw_text(&self, buf: &mut Buffer, area: Rect, x: u16, y: u16, text: &str, style: ratatui::style::Style) {
        let mut x = x;
        for ch in text.chars() {
            if x >= area.x + area.width {
                break;
            }
            buf[(x, y)].set_char(ch).set_style(style);
            x += 1;
        }
    }
}

impl Widget for TransportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" TRANSPORT ", self.theme.title()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 30 || inner.height < 1 {
            return;
        }

        let labels: [(&str, bool); 4] = [
            ("◀◀ REW", self.buttons.rewind),
            (" ▶ PLAY", self.buttons.play),
            (" ■ STOP", false),
            ("▶▶ FFWD", self.buttons.fast_forward),
        ];

        let mut x = inner.x + 1;
        let y = inner.y;
        for (label, active) in labels {
            let style = if active {
                self.theme.button_active()
            } else {
                self.theme.button_inactive()
            };
            self.draw_text(buf, inner, x, y, label, style);
            x += label.chars().count() as u16 + 2;
        }

        // Tape counter, right-aligned
        let counter = format!("{} ", self.readout);
        let counter_len = counter.chars().count() as u16;
        if inner.width > counter_len {
            let counter_x = inner.x + inner.width - counter_len;
            self.draw_text(buf, inner, counter_x, y, &counter, self.theme.normal());
        }

        // Speed selector on the second row
        if inner.height >= 2 {
            let y = inner.y + 1;
            let mut x = inner.x + 1;
            self.draw_text(buf, inner, x, y, "SPEED", self.theme.dim());
            x += 7;
            for (label, rate) in [("SLOW", 0.8), ("STD", 1.0), ("FAST", 1.2)] {
                let style = if (self.selected_rate - rate).abs() < 1e-9 {
                    self.theme.button_active()
                } else {
                    self.theme.button_inactive()
                };
                self.draw_text(buf, inner, x, y, label, style);
                x += label.len() as u16 + 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(width: u16, height: u16, buttons: ButtonStates) -> Buffer {
        let theme = Theme::default();
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(&theme)
            .buttons(buttons)
            .readout("00:12 / 03:00")
            .render(area, &mut buf);
        buf
    }

    fn content(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
        }
        out
    }

    #[test]
    fn renders_buttons_and_counter() {
        let buf = render(
            60,
            4,
            ButtonStates {
                play: true,
                ..Default::default()
            },
        );
        let text = content(&buf);
        assert!(text.contains("PLAY"));
        assert!(text.contains("STOP"));
        assert!(text.contains("00:12 / 03:00"));
    }

    #[test]
    fn tiny_areas_render_without_panic() {
        for (w, h) in [(0, 0), (5, 1), (10, 2)] {
            render(w, h, ButtonStates::default());
        }
    }
}
