//! Frame-counted feedback animations
//!
//! Frames count from 1 (tick 0 renders frame 1). Speed only changes the
//! tick interval, so every curve keeps its shape at any speed.

use buzzlight_core::{clamp_level, Animation, Color, Frame, RoutineError, TickOutcome};

/// Wipe frames before the lights go dark
const WIPE_FRAMES: u64 = 40;
const WIPE_STEP: f32 = 0.4;
const WIPE_FALLOFF: f32 = 35.0;

const TOUCH_FADE_FRAMES: f32 = 8.0;
const TOUCH_COLOR: Color = Color::new(90, 0, 127);

const RELEASE_FRAMES: f32 = 15.0;

const FLASH_FRAMES: u64 = 5;
const CLICK_FADE_FRAMES: f32 = 20.0;
/// 200ms at the 20ms click cadence
const CLICK_HOLD_FRAMES: u64 = 10;
const ACCENT: Color = Color::new(0, 127, 0);

/// Which way the highlight travels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeDirection {
    /// Zone 0 first, orange
    Rightward,
    /// Last zone first, cyan
    Leftward,
}

/// A soft highlight passing across the zones, then off
#[derive(Debug, Clone, Copy)]
pub struct Wipe {
    direction: WipeDirection,
}

impl Wipe {
    pub fn new(direction: WipeDirection) -> Self {
        Self { direction }
    }

    /// Highlight level for the `order`-th zone the wipe reaches
    fn level(frame: u64, order: usize) -> i32 {
        let pos = frame as f32 * WIPE_STEP;
        let center = 1.0 + 2.0 * order as f32;
        clamp_level(127.0 - (pos - center).abs() * WIPE_FALLOFF)
    }
}

impl Animation for Wipe {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        let step = tick + 1;
        let zones = frame.zone_count();
        for order in 0..zones {
            let level = Self::level(step, order);
            match self.direction {
                WipeDirection::Rightward => frame.set(
                    order,
                    Color::new(level, clamp_level(level as f32 * 0.3), 0),
                ),
                WipeDirection::Leftward => frame.set(zones - 1 - order, Color::new(0, level, level)),
            }
        }

        if step > WIPE_FRAMES {
            frame.fill(Color::OFF);
            return Ok(TickOutcome::Finished);
        }
        Ok(TickOutcome::Continue)
    }
}

/// Fade in to violet, then pulse gently until replaced
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchHold;

impl Animation for TouchHold {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        let step = (tick + 1) as f32;
        let t = (step / TOUCH_FADE_FRAMES).min(1.0);
        if t < 1.0 {
            frame.fill(Color::lerp(Color::OFF, TOUCH_COLOR, t));
        } else {
            let pulse = ((step - TOUCH_FADE_FRAMES) * 0.15).sin() * 15.0 + 112.0;
            frame.fill(Color::new(TOUCH_COLOR.r, 0, clamp_level(pulse)));
        }
        Ok(TickOutcome::Continue)
    }
}

/// Linear fade from the touch color to off
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseFade;

impl Animation for ReleaseFade {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        let t = ((tick + 1) as f32 / RELEASE_FRAMES).min(1.0);
        frame.fill(Color::lerp(TOUCH_COLOR, Color::OFF, t));
        if t >= 1.0 {
            return Ok(TickOutcome::Finished);
        }
        Ok(TickOutcome::Continue)
    }
}

/// White flash, fade to green, short hold, off
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickFlash;

impl ClickFlash {
    /// Frame on which the green fade completes
    const FADE_END: u64 = FLASH_FRAMES + CLICK_FADE_FRAMES as u64;
}

impl Animation for ClickFlash {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        let step = tick + 1;
        if step < FLASH_FRAMES {
            frame.fill(Color::WHITE);
        } else if step <= Self::FADE_END {
            let t = ((step - FLASH_FRAMES) as f32 / CLICK_FADE_FRAMES).min(1.0);
            frame.fill(Color::lerp(Color::WHITE, ACCENT, t));
        } else if step >= Self::FADE_END + CLICK_HOLD_FRAMES {
            frame.fill(Color::OFF);
            return Ok(TickOutcome::Finished);
        }
        Ok(TickOutcome::Continue)
    }
}
