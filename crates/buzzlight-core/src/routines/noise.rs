//! Routines driven by a random source

use crate::animation::{Animation, Frame, RoutineError, TickOutcome};
use crate::color::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseStyle {
    /// Magenta/cyan checker with rare white glitches
    Cyber,
    /// Random colors, each zone updating about half the time
    Disco,
    /// Red with flickering orange
    Fire,
    /// Green rain with occasional full-green drops
    Matrix,
    /// Red with sporadic orange eruptions
    Volcano,
}

pub struct NoiseRoutine {
    style: NoiseStyle,
    rng: StdRng,
}

impl NoiseRoutine {
    pub fn new(style: NoiseStyle) -> Self {
        Self {
            style,
            rng: StdRng::from_os_rng(),
        }
    }

    #[cfg(test)]
    pub fn with_seed(style: NoiseStyle, seed: u64) -> Self {
        Self {
            style,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn cyber(&mut self, frame: &mut Frame<'_>, tick: u64) {
        let glitch = self.rng.random_bool(0.1);
        for idx in 0..frame.zone_count() {
            let signal = (tick as f32 * 0.2 + idx as f32).floor() as u64 % 2;
            let color = if glitch {
                Color::WHITE
            } else if signal == 0 {
                Color::new(127, 0, 80)
            } else {
                Color::new(0, 127, 127)
            };
            frame.set(idx, color);
        }
    }

    fn disco(&mut self, frame: &mut Frame<'_>) {
        for idx in 0..frame.zone_count() {
            if self.rng.random_bool(0.5) {
                continue;
            }
            let r = self.rng.random_range(0..127);
            let g = self.rng.random_range(0..127);
            let b = self.rng.random_range(0..127);
            frame.set(idx, Color::new(r, g, b));
        }
    }

    fn fire(&mut self, frame: &mut Frame<'_>) {
        for idx in 0..frame.zone_count() {
            let r = 100.0 + self.rng.random::<f32>() * 27.0;
            let g = self.rng.random::<f32>() * 40.0;
            frame.set(idx, Color::floor(r, g, 0.0));
        }
    }

    fn matrix(&mut self, frame: &mut Frame<'_>) {
        let drop = Color::new(0, 127, 0);
        if self.rng.random_bool(0.1) && frame.zone_count() > 0 {
            let target = self.rng.random_range(0..frame.zone_count());
            frame.set(target, drop);
        }
        for idx in 0..frame.zone_count() {
            let level = self.rng.random::<f32>().powi(3) * 127.0;
            if level > 100.0 {
                frame.set(idx, drop);
            } else {
                frame.set(idx, Color::floor(0.0, level, 0.0));
            }
        }
    }

    fn volcano(&mut self, frame: &mut Frame<'_>) {
        for idx in 0..frame.zone_count() {
            let r = 100.0 + self.rng.random::<f32>() * 27.0;
            let g = if self.rng.random_bool(0.3) {
                self.rng.random::<f32>() * 80.0
            } else {
                0.0
            };
            frame.set(idx, Color::floor(r, g, 0.0));
        }
    }
}

impl Animation for NoiseRoutine {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        match self.style {
            NoiseStyle::Cyber => self.cyber(frame, tick),
            NoiseStyle::Disco => self.disco(frame),
            NoiseStyle::Fire => self.fire(frame),
            NoiseStyle::Matrix => self.matrix(frame),
            NoiseStyle::Volcano => self.volcano(frame),
        }
        Ok(TickOutcome::Continue)
    }
}
