//! Tape coloration effects and the master output bus
//!
//! Three independently toggleable effects feed the master bus:
//! - Crackle: additive one-shot noise bed (hiss, clicks, pops)
//! - Gramophone: serial horn-band coloration (EQ voicing, saturation, warble)
//! - Echo: parallel wet-only delay tap
//!
//! The dry path is always connected at unity gain, so toggling a coloration
//! effect never causes a loudness jump on the unprocessed signal.

mod crackle;
mod echo;
mod gramophone;
mod winding;

pub use crackle::{Crackle, OneShotState};
pub use echo::Echo;
pub use gramophone::Gramophone;
pub use winding::WindingLoop;

/// Named, independently toggleable coloration effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectName {
    Crackle,
    Gramophone,
    Echo,
}

impl EffectName {
    pub const ALL: [EffectName; 3] = [EffectName::Crackle, EffectName::Gramophone, EffectName::Echo];

    pub fn label(self) -> &'static str {
        match self {
            EffectName::Crackle => "CRACKLE",
            EffectName::Gramophone => "GRAMOPHONE",
            EffectName::Echo => "ECHO",
        }
    }
}

/// One processing stage in the active connection plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Additive noise from the crackle generator.
    CrackleBed,
    /// Serial full-chain coloration; defines the whole timbre while active.
    Gramophone,
    /// Parallel wet-only tap; the dry signal is unaffected.
    EchoTap,
}

/// Declarative description of what is connected to the master bus right now.
///
/// Recomputed from the enable flags on every [`EffectsGraph::route`] call, so
/// the "what is connected" invariant lives in one place instead of being
/// scattered across toggle handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    /// The unprocessed path. Always present at unity gain.
    pub dry_unity: bool,
    /// Enabled stages in processing order.
    pub stages: Vec<Stage>,
}

impl ConnectionPlan {
    fn passthrough() -> Self {
        Self {
            dry_unity: true,
            stages: Vec::new(),
        }
    }
}

/// The effects chain plus the master summing bus.
///
/// Owns every effect node exclusively; all mutation goes through these
/// methods. Failures inside a single effect are absorbed here and never
/// silence the dry path.
pub struct EffectsGraph {
    crackle: Crackle,
    gramophone: Gramophone,
    echo: Echo,
    plan: ConnectionPlan,
    master_volume: f32,
    /// Smoothed master gain to avoid clicks on volume changes.
    smoothed_master: f32,
}

impl EffectsGraph {
    /// Smoothing coefficient for master volume (~5ms at 48kHz)
    const MASTER_SMOOTH_COEFF: f32 = 0.995;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            crackle: Crackle::new(sample_rate),
            gramophone: Gramophone::new(sample_rate),
            echo: Echo::new(sample_rate),
            plan: ConnectionPlan::passthrough(),
            master_volume: 1.0,
            smoothed_master: 1.0,
        }
    }

    /// Flip an effect's enabled flag and rebuild the connection plan.
    ///
    /// For the crackle effect this also manages the one-shot generator
    /// lifecycle (a stopped generator cannot be restarted; a fresh one is
    /// built instead).
    pub fn toggle(&mut self, name: EffectName) {
        let enabled = !self.is_enabled(name);
        self.set_enabled(name, enabled);
    }

    pub fn set_enabled(&mut self, name: EffectName, enabled: bool) {
        match name {
            EffectName::Crackle => self.crackle.set_enabled(enabled),
            EffectName::Gramophone => self.gramophone.set_enabled(enabled),
            EffectName::Echo => self.echo.set_enabled(enabled),
        }
        self.route();
    }

    pub fn is_enabled(&self, name: EffectName) -> bool {
        match name {
            EffectName::Crackle => self.crackle.is_enabled(),
            EffectName::Gramophone => self.gramophone.is_enabled(),
            EffectName::Echo => self.echo.is_enabled(),
        }
    }

    /// Scale only the named effect's contribution to the mix.
    pub fn set_effect_volume(&mut self, name: EffectName, level: f32) {
        match name {
            EffectName::Crackle => self.crackle.set_level(level),
            EffectName::Gramophone => self.gramophone.set_level(level),
            EffectName::Echo => self.echo.set_level(level),
        }
    }

    pub fn effect_volume(&self, name: EffectName) -> f32 {
        match name {
            EffectName::Crackle => self.crackle.level(),
            EffectName::Gramophone => self.gramophone.level(),
            EffectName::Echo => self.echo.level(),
        }
    }

    pub fn set_master_volume(&mut self, level: f32) {
        self.master_volume = level.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Recompute the connection plan from the current enable flags.
    ///
    /// Idempotent: calling this twice with unchanged flags yields an
    /// identical plan, so there is no such thing as a duplicate connection.
    /// With every effect disabled the plan reduces to pure passthrough.
    pub fn route(&mut self) -> &ConnectionPlan {
        let mut stages = Vec::with_capacity(3);
        if self.crackle.is_enabled() {
            stages.push(Stage::CrackleBed);
        }
        if self.gramophone.is_enabled() {
            stages.push(Stage::Gramophone);
        }
        if self.echo.is_enabled() {
            stages.push(Stage::EchoTap);
        }
        self.plan = ConnectionPlan {
            dry_unity: true,
            stages,
        };
        &self.plan
    }

    pub fn plan(&self) -> &ConnectionPlan {
        &self.plan
    }

    /// Run the active plan over a stereo interleaved buffer.
    pub fn process(&mut self, samples: &mut [f32]) {
        for i in 0..self.plan.stages.len() {
            let stage = self.plan.stages[i];
            match stage {
                Stage::CrackleBed => self.crackle.process(samples),
                Stage::Gramophone => self.gramophone.process(samples),
                Stage::EchoTap => self.echo.process(samples),
            }
        }
    }

    /// Apply the (smoothed) master gain. Called last in the render chain so
    /// the mechanical winding loop is also governed by it.
    pub fn apply_master(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            self.smoothed_master = Self::MASTER_SMOOTH_COEFF * self.smoothed_master
                + (1.0 - Self::MASTER_SMOOTH_COEFF) * self.master_volume;
            *s *= self.smoothed_master;
        }
    }

    /// Lifecycle of the crackle noise generator, for the status display.
    pub fn crackle_generator_state(&self) -> OneShotState {
        self.crackle.generator_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_is_idempotent() {
        let mut graph = EffectsGraph::new(48000.0);
        graph.set_enabled(EffectName::Gramophone, true);
        graph.set_enabled(EffectName::Echo, true);

        let first = graph.route().clone();
        let second = graph.route().clone();
        assert_eq!(first, second);
        assert_eq!(first.stages, vec![Stage::Gramophone, Stage::EchoTap]);
    }

    #[test]
    fn dry_path_stays_at_unity_for_every_toggle_combination() {
        let mut graph = EffectsGraph::new(48000.0);

        for mask in 0..8u8 {
            graph.set_enabled(EffectName::Crackle, mask & 1 != 0);
            graph.set_enabled(EffectName::Gramophone, mask & 2 != 0);
            graph.set_enabled(EffectName::Echo, mask & 4 != 0);
            assert!(graph.plan().dry_unity, "dry bus disconnected at mask {mask}");
        }
    }

    #[test]
    fn all_disabled_reduces_to_passthrough() {
        let mut graph = EffectsGraph::new(48000.0);
        graph.set_enabled(EffectName::Echo, true);
        graph.set_enabled(EffectName::Echo, false);

        assert!(graph.plan().stages.is_empty());
        assert!(graph.plan().dry_unity);

        let mut samples = vec![0.25f32, -0.25, 0.5, -0.5];
        let original = samples.clone();
        graph.process(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn disabling_one_effect_leaves_others_connected() {
        let mut graph = EffectsGraph::new(48000.0);
        graph.set_enabled(EffectName::Crackle, true);
        graph.set_enabled(EffectName::Echo, true);
        graph.set_enabled(EffectName::Crackle, false);

        assert_eq!(graph.plan().stages, vec![Stage::EchoTap]);
    }

    #[test]
    fn graph_manages_the_crackle_one_shot_lifecycle() {
        let mut graph = EffectsGraph::new(48000.0);
        graph.toggle(EffectName::Crackle);
        assert_eq!(graph.crackle_generator_state(), OneShotState::Started);
        graph.toggle(EffectName::Crackle);
        assert_eq!(graph.crackle_generator_state(), OneShotState::Exhausted);
        graph.toggle(EffectName::Crackle);
        assert_eq!(graph.crackle_generator_state(), OneShotState::Started);
    }

    #[test]
    fn master_volume_is_clamped() {
        let mut graph = EffectsGraph::new(48000.0);
        graph.set_master_volume(3.0);
        assert_eq!(graph.master_volume(), 1.0);
        graph.set_master_volume(-1.0);
        assert_eq!(graph.master_volume(), 0.0);
    }

    #[test]
    fn processing_stays_finite_with_everything_on() {
        let mut graph = EffectsGraph::new(48000.0);
        for name in EffectName::ALL {
            graph.set_enabled(name, true);
        }

        let mut samples = vec![0.5f32; 2048];
        graph.process(&mut samples);
        graph.apply_master(&mut samples);
        assert!(samples.iter().all(|s| s.is_finite()));
    }
}
