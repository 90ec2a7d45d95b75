//! Spool rotation model
//!
//! Pure bookkeeping for the two tape spools: angles accumulate from elapsed
//! wall time, playback rate, and direction. Rendering lives in the TUI crate;
//! this module only answers "where are the spools pointing right now".

use crate::engine::Direction;

/// Base angular speed at rate 1.0, in radians per second.
pub const BASE_ANGULAR_SPEED: f64 = 2.4;
/// The takeup spool spins slightly faster than the supply spool, like a real
/// deck where the takeup hub carries less tape.
pub const LEFT_FACTOR: f64 = 1.0;
pub const RIGHT_FACTOR: f64 = 1.35;

pub struct SpoolAnimator {
    left_angle: f64,
    right_angle: f64,
    rate: f64,
    direction_sign: f64,
    running: bool,
}

impl Default for SpoolAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpoolAnimator {
    pub fn new() -> Self {
        Self {
            left_angle: 0.0,
            right_angle: 0.0,
            rate: 1.0,
            direction_sign: 1.0,
            running: false,
        }
    }

    /// Begin (or retarget) rotation. Angles are never reset: restarting
    /// continues from wherever the spools stopped.
    pub fn start(&mut self, rate: f64, direction: Direction) {
        self.rate = rate;
        self.direction_sign = direction.sign();
        self.running = true;
    }

    /// Freeze rotation in place.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Change speed mid-flight without touching the angles.
    pub fn update_speed(&mut self, rate: f64, direction: Direction) {
        self.rate = rate;
        self.direction_sign = direction.sign();
    }

    /// Advance the rotation by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f64) {
        if !self.running || dt <= 0.0 {
            return;
        }
        let step = dt * BASE_ANGULAR_SPEED * self.rate * self.direction_sign;
        self.left_angle += step * LEFT_FACTOR;
        self.right_angle += step * RIGHT_FACTOR;
    }

    /// Current (left, right) angles in radians, unbounded.
    pub fn angles(&self) -> (f64, f64) {
        (self.left_angle, self.right_angle)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_spools_hold_their_angles() {
        let mut spools = SpoolAnimator::new();
        spools.start(1.0, Direction::Forward);
        spools.advance(2.0);
        let before = spools.angles();

        spools.stop();
        spools.advance(5.0);
        assert_eq!(spools.angles(), before);
    }

    #[test]
    fn restart_continues_from_frozen_angles() {
        let mut spools = SpoolAnimator::new();
        spools.start(1.0, Direction::Forward);
        spools.advance(1.0);
        let frozen = spools.angles();
        spools.stop();

        spools.start(1.0, Direction::Forward);
        assert_eq!(spools.angles(), frozen);
        spools.advance(1.0);
        assert!(spools.angles().0 > frozen.0);
    }

    #[test]
    fn reverse_direction_spins_backwards() {
        let mut spools = SpoolAnimator::new();
        spools.start(1.0, Direction::Reverse);
        spools.advance(1.0);
        let (left, right) = spools.angles();
        assert!(left < 0.0);
        assert!(right < 0.0);
    }

    #[test]
    fn rate_scales_angular_speed() {
        let mut slow = SpoolAnimator::new();
        slow.start(1.0, Direction::Forward);
        slow.advance(1.0);

        let mut fast = SpoolAnimator::new();
        fast.start(5.0, Direction::Forward);
        fast.advance(1.0);

        let ratio = fast.angles().0 / slow.angles().0;
        assert!((ratio - 5.0).abs() < 1e-9);
    }

    #[test]
    fn spools_spin_at_different_speeds() {
        let mut spools = SpoolAnimator::new();
        spools.start(1.0, Direction::Forward);
        spools.advance(1.0);
        let (left, right) = spools.angles();
        assert!((left - BASE_ANGULAR_SPEED).abs() < 1e-9);
        assert!((right - BASE_ANGULAR_SPEED * RIGHT_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn speed_update_does_not_jump_angles() {
        let mut spools = SpoolAnimator::new();
        spools.start(1.0, Direction::Forward);
        spools.advance(1.0);
        let before = spools.angles();

        spools.update_speed(5.0, Direction::Reverse);
        assert_eq!(spools.angles(), before);
    }
}
