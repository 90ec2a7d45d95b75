//! Spool window widget - the two spinning tape spools
//!
//! Rendering splits into pure geometry (testable without a terminal) and a
//! thin canvas painter. The geometry tolerates degenerate window sizes by
//! collapsing radii to zero instead of panicking.

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Line},
        Block, Borders, Widget,
    },
};

/// Spokes per spool, evenly spaced around the hub.
const SPOKE_COUNT: usize = 3;

/// Largest spool radius that fits a window of `width` x `height` units,
/// never negative.
pub fn spool_radius(width: f64, height: f64) -> f64 {
    let limit = (width / 4.0).min(height / 2.0) - 2.0;
    limit.max(0.0)
}

/// Endpoints of spoke `index` at rotation `angle`, from the hub edge to the
/// rim.
pub fn spoke_line(
    cx: f64,
    cy: f64,
    radius: f64,
    angle: f64,
    index: usize,
) -> ((f64, f64), (f64, f64)) {
    let theta = angle + index as f64 * std::f64::consts::TAU / SPOKE_COUNT as f64;
    let hub = radius * 0.25;
    let rim = radius * 0.85;
    let (sin, cos) = theta.sin_cos();
    ((cx + hub * cos, cy + hub * sin), (cx + rim * cos, cy + rim * sin))
}

pub struct SpoolsWidget<'a> {
    theme: &'a Theme,
    left_angle: f64,
    right_angle: f64,
    /// How much tape remains on the supply spool (0.0 - 1.0); drawn as the
    /// tape band thickness.
    progress: f64,
}

impl<'a> SpoolsWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            left_angle: 0.0,
            right_angle: 0.0,
            progress: 0.0,
        }
    }

    pub fn angles(mut self, left: f64, right: f64) -> Self {
        self.left_angle = left;
        self.right_angle = right;
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = progress.clamp(0.0, 1.0);
        self
    }

    fn draw_spool(&self, ctx: &mut ratatui::widgets::canvas::Context, cx: f64, cy: f64, radius: f64, angle: f64, band: f64) {
        if radius <= 0.0 {
            return;
        }

        // Rim and hub
        ctx.draw(&Circle {
            x: cx,
            y: cy,
            radius,
            color: self.theme.spool,
        });
        ctx.draw(&Circle {
            x: cx,
            y: cy,
            radius: radius * 0.25,
            color: self.theme.spool,
        });

        // Wound tape band
        if band > 0.05 {
            ctx.draw(&Circle {
                x: cx,
                y: cy,
                radius: radius * (0.3 + 0.6 * band),
                color: self.theme.tape,
            });
        }

        // Spokes show the rotation
        for index in 0..SPOKE_COUNT {
            let ((x1, y1), (x2, y2)) = spoke_line(cx, cy, radius, angle, index);
            ctx.draw(&Line {
                x1,
                y1,
                x2,
                y2,
                color: self.theme.spool,
            });
        }
    }
}

impl Widget for SpoolsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(" REEL ", self.theme.title()));
        let inner = block.inner(area);

        let width = inner.width as f64 * 2.0;
        let height = inner.height as f64 * 4.0;
        let radius = spool_radius(width, height);
        let left_cx = width * 0.27;
        let right_cx = width * 0.73;
        let cy = height / 2.0;

        Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, width.max(1.0)])
            .y_bounds([0.0, height.max(1.0)])
            .paint(|ctx| {
                // Supply spool empties as the takeup spool fills.
                self.draw_spool(ctx, left_cx, cy, radius, self.left_angle, 1.0 - self.progress);
                self.draw_spool(ctx, right_cx, cy, radius, self.right_angle, self.progress);

                // Tape path between the spools
                if radius > 0.0 {
                    ctx.draw(&Line {
                        x1: left_cx,
                        y1: cy + radius,
                        x2: right_cx,
                        y2: cy + radius,
                        color: self.theme.tape,
                    });
                }
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_collapses_to_zero_on_degenerate_windows() {
        assert_eq!(spool_radius(0.0, 0.0), 0.0);
        assert_eq!(spool_radius(1.0, 1.0), 0.0);
        assert_eq!(spool_radius(-10.0, 40.0), 0.0);
    }

    #[test]
    fn radius_is_positive_for_real_windows() {
        assert!(spool_radius(120.0, 48.0) > 0.0);
    }

    #[test]
    fn spokes_rotate_with_the_angle() {
        let ((_, _), (x_a, y_a)) = spoke_line(0.0, 0.0, 10.0, 0.0, 0);
        let ((_, _), (x_b, y_b)) = spoke_line(0.0, 0.0, 10.0, 1.0, 0);
        assert!((x_a - x_b).abs() > 1e-6 || (y_a - y_b).abs() > 1e-6);
    }

    #[test]
    fn spokes_stay_inside_the_rim() {
        for index in 0..3 {
            let ((x1, y1), (x2, y2)) = spoke_line(5.0, 5.0, 10.0, 0.7, index);
            for (x, y) in [(x1, y1), (x2, y2)] {
                let dist = ((x - 5.0).powi(2) + (y - 5.0).powi(2)).sqrt();
                assert!(dist <= 10.0 + 1e-9);
            }
        }
    }

    #[test]
    fn spokes_are_evenly_spaced() {
        let angle_of = |index| {
            let ((_, _), (x, y)) = spoke_line(0.0, 0.0, 1.0, 0.0, index);
            f64::atan2(y, x)
        };
        let spacing = (angle_of(1) - angle_of(0)).abs();
        assert!((spacing - std::f64::consts::TAU / 3.0).abs() < 1e-9);
    }

    #[test]
    fn tiny_areas_render_without_panic() {
        let theme = Theme::default();
        for (w, h) in [(0, 0), (1, 1), (2, 1), (3, 2)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            SpoolsWidget::new(&theme)
                .angles(1.2, 3.4)
                .progress(0.5)
                .render(area, &mut buf);
        }
    }
}
