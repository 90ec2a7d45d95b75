//! Color themes for the deck faceplate

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (active buttons, titles)
    pub highlight: Color,
    /// Accent color (level bars, readout)
    pub accent: Color,
    /// Warning color
    pub warning: Color,
    /// Error color
    pub danger: Color,
    /// Spool body color
    pub spool: Color,
    /// Tape band color
    pub tape: Color,
}

impl Theme {
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for a lit transport button
    pub fn button_active(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for an unlit transport button
    pub fn button_inactive(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn fx_enabled(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn fx_disabled(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    pub fn danger_style(&self) -> Style {
        Style::default().fg(self.danger).add_modifier(Modifier::BOLD)
    }

    /// Look a theme up by its config name, falling back to the default.
    pub fn by_name(name: &str) -> Theme {
        match name {
            "walnut" => WALNUT,
            "chrome" => CHROME,
            "midnight" => MIDNIGHT,
            _ => Theme::default(),
        }
    }
}

/// Warm amber-on-walnut, the look of a 70s deck faceplate
pub const WALNUT: Theme = Theme {
    name: "walnut",
    fg: Color::Rgb(235, 200, 150),
    fg_dim: Color::Rgb(130, 105, 70),
    bg: Color::Rgb(20, 12, 6),
    highlight: Color::Rgb(255, 190, 80),
    accent: Color::Rgb(255, 150, 60),
    warning: Color::Rgb(255, 220, 90),
    danger: Color::Rgb(255, 90, 80),
    spool: Color::Rgb(200, 170, 120),
    tape: Color::Rgb(120, 80, 45),
};

/// Brushed metal and cyan meters
pub const CHROME: Theme = Theme {
    name: "chrome",
    fg: Color::Rgb(210, 215, 220),
    fg_dim: Color::Rgb(110, 118, 125),
    bg: Color::Rgb(12, 14, 16),
    highlight: Color::Rgb(120, 220, 255),
    accent: Color::Rgb(90, 200, 240),
    warning: Color::Rgb(250, 220, 110),
    danger: Color::Rgb(255, 95, 95),
    spool: Color::Rgb(190, 195, 200),
    tape: Color::Rgb(90, 95, 100),
};

/// Low-light studio look
pub const MIDNIGHT: Theme = Theme {
    name: "midnight",
    fg: Color::Rgb(170, 180, 220),
    fg_dim: Color::Rgb(80, 88, 120),
    bg: Color::Rgb(6, 8, 18),
    highlight: Color::Rgb(150, 170, 255),
    accent: Color::Rgb(120, 140, 255),
    warning: Color::Rgb(240, 220, 120),
    danger: Color::Rgb(255, 100, 110),
    spool: Color::Rgb(140, 150, 200),
    tape: Color::Rgb(70, 75, 110),
};

impl Default for Theme {
    fn default() -> Self {
        WALNUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_resolves_known_themes() {
        assert_eq!(Theme::by_name("chrome").name, "chrome");
        assert_eq!(Theme::by_name("midnight").name, "midnight");
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(Theme::by_name("plasma").name, WALNUT.name);
    }
}
