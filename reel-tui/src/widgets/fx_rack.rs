//! Effects rack widget - coloration toggles and the master volume

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::{Block, Borders, Widget},
};
use reel_audio::EffectSnapshot;

/// Build a horizontal level bar of `width` cells for `level` in 0.0 - 1.0.
pub fn level_bar(width: usize, level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..width {
        bar.push('░');
    }
    bar
}

pub struct FxRackWidget<'a> {
    theme: &'a Theme,
    crackle: EffectSnapshot,
    gramophone: EffectSnapshot,
    echo: EffectSnapshot,
    master_volume: f32,
}

impl<'a> FxRackWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            crackle: EffectSnapshot::default(),
            gramophone: EffectSnapshot::default(),
            echo: EffectSnapshot::default(),
            master_volume: 1.0,
        }
    }

    pub fn effects(
        mut self,
        crackle: EffectSnapshot,
        gramophone: EffectSnapshot,
        echo: EffectSnapshot,
    ) -> Self {
        self.crackle = crackle;
        self.gramophone = gramophone;
        self.echo = echo;
        self
    }

    pub fn master_volume(mut self, volume: f32) -> Self {
        self.master_volume = volume;
        self
    }

    fn draw_row(&self, buf: &mut Buffer, inner: Rect, row: u16, key: char, label: &str, snapshot: EffectSnapshot) {
        let y = inner.y + row;
        if y >= inner.y + inner.height {
            return;
        }
        let style = if snapshot.enabled {
            self.theme.fx_enabled()
        } else {
            self.theme.fx_disabled()
        };

        let bar_width = inner.width.saturating_sub(20) as usize;
        let line = format!(
            "[{key}] {label:<11} {} {}",
            if snapshot.enabled { "ON " } else { "OFF" },
            level_bar(bar_width, snapshot.level),
        );
        let mut x = inner.x + 1;
        for ch in line.chars() {
            if x >= inner.x + inner.width {
                break;
            }
            buf[(x, y)].set_char(ch).set_style(style);
            x += 1;
        }
    }
}

impl Widget for FxRackWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" COLORATION ", self.theme.title()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 24 || inner.height < 4 {
            return;
        }

        self.draw_row(buf, inner, 0, 'c', "CRACKLE", self.crackle);
        self.draw_row(buf, inner, 1, 'g', "GRAMOPHONE", self.gramophone);
        self.draw_row(buf, inner, 2, 'e', "ECHO", self.echo);

        // Master volume on the last visible row
        let y = inner.y + 3;
        if y < inner.y + inner.height {
            let bar_width = inner.width.saturating_sub(20) as usize;
            let line = format!(
                "    MASTER      {:>3.0} {}",
                self.master_volume * 100.0,
                level_bar(bar_width, self.master_volume),
            );
            let mut x = inner.x + 1;
            for ch in line.chars() {
                if x >= inner.x + inner.width {
                    break;
                }
                buf[(x, y)].set_char(ch).set_style(self.theme.normal());
                x += 1;
            }
        }
    }
}
