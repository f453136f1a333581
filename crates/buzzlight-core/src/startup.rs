//! The one-shot welcome sweep played when the device connects
//!
//! It runs on its own timer at a fixed cadence, outside the scheduler's
//! background/interaction slots. The owner aborts it when anything else
//! takes over the lights.

use crate::animation::{Animation, Frame, RoutineError, TickOutcome};
use crate::color::Color;
use crate::error::CoreError;
use crate::registry::AnimationDescriptor;
use crate::scheduler::PeriodicTimer;
use crate::sink::ColorSink;
use std::f32::consts::PI;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Registry id reserved for the welcome sweep
pub const STARTUP_ID: &str = "welcome";

const INTERVAL_MS: u64 = 25;
const SWEEP_TICKS: u64 = 300;
const FADE_TICKS: u64 = 80;
const PEAK_LEVEL: f32 = 0.6;
const TAIL_COLOR: Color = Color::new(60, 40, 80);

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Pastel hue wheel position `hue` (0..1) lifted towards white
fn pastel(hue: f32) -> [f32; 3] {
    let h = hue * 6.0;
    let x = 1.0 - ((h % 2.0) - 1.0).abs();
    let (r, g, b) = match h {
        h if h < 1.0 => (1.0, x, 0.0),
        h if h < 2.0 => (x, 1.0, 0.0),
        h if h < 3.0 => (0.0, 1.0, x),
        h if h < 4.0 => (0.0, x, 1.0),
        h if h < 5.0 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [r, g, b].map(|c| (c * 100.0 + 27.0).floor())
}

/// Staggered pastel sweep, a purple fade-out tail, then off
///
/// 300 sweep ticks and 80 tail ticks; tick 380 blanks every zone and
/// finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WelcomeSweep;

impl WelcomeSweep {
    /// Create the sweep
    pub fn new() -> Self {
        Self
    }

    /// Registry entry for the sweep, at its fixed 25ms cadence
    pub fn descriptor() -> AnimationDescriptor {
        AnimationDescriptor::new(STARTUP_ID, "Welcome", INTERVAL_MS, || -> Box<dyn Animation> {
            Box::new(WelcomeSweep::new())
        })
    }

    fn zone_level(progress: f32, zone: usize) -> f32 {
        let stagger = zone as f32 * 0.15;
        let local = (progress - stagger) / 0.7;
        if !(0.0..=1.0).contains(&local) {
            return 0.0;
        }
        ease_in_out_cubic((local * PI).sin())
    }
}

impl Animation for WelcomeSweep {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        let step = tick + 1;
        if step <= SWEEP_TICKS {
            let progress = step as f32 / SWEEP_TICKS as f32;
            for idx in 0..frame.zone_count() {
                let level = Self::zone_level(progress, idx) * PEAK_LEVEL;
                let hue = (progress * 2.0 + idx as f32 * 0.1) % 1.0;
                let [r, g, b] = pastel(hue);
                frame.set(idx, Color::floor(r * level, g * level, b * level));
            }
            Ok(TickOutcome::Continue)
        } else if step <= SWEEP_TICKS + FADE_TICKS {
            let fade = (step - SWEEP_TICKS) as f32 / FADE_TICKS as f32;
            frame.fill(TAIL_COLOR.scaled(1.0 - ease_in_out_cubic(fade)));
            Ok(TickOutcome::Continue)
        } else {
            frame.fill(Color::OFF);
            Ok(TickOutcome::Finished)
        }
    }
}

/// What [`StartupSequence::poll`] observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupProgress {
    /// Not running
    Idle,
    /// Still playing
    Running,
    /// Finished on this poll; zones are off
    Completed,
}

struct ActiveSequence {
    id: String,
    routine: Box<dyn Animation>,
    timer: PeriodicTimer,
}

/// Guarded runner for the welcome sweep
#[derive(Default)]
pub struct StartupSequence {
    active: Option<ActiveSequence>,
}

impl StartupSequence {
    /// Idle runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `descriptor` at its base interval
    ///
    /// Returns `false` without touching the running sequence if one is
    /// already playing.
    pub fn begin(&mut self, descriptor: &AnimationDescriptor, now: Instant) -> bool {
        if self.active.is_some() {
            warn!("Startup sequence already running");
            return false;
        }
        info!("Playing startup sequence");
        self.active = Some(ActiveSequence {
            id: descriptor.id.clone(),
            routine: descriptor.instantiate(),
            timer: PeriodicTimer::new(Duration::from_millis(descriptor.base_interval_ms), now),
        });
        true
    }

    /// Stop without blanking; returns whether it was running
    pub fn abort(&mut self) -> bool {
        let was_running = self.active.take().is_some();
        if was_running {
            debug!("Startup sequence aborted");
        }
        was_running
    }

    /// Whether the sequence is playing
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// When the next frame is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.active.as_ref().map(|a| a.timer.next_due())
    }

    /// Render the due frame, if any
    pub fn poll(&mut self, now: Instant, sink: &mut ColorSink) -> StartupProgress {
        let Some(active) = self.active.as_mut() else {
            return StartupProgress::Idle;
        };
        if !active.timer.is_due(now) {
            return StartupProgress::Running;
        }

        let tick = active.timer.advance(now);
        let mut frame = Frame::new(sink);
        match active.routine.tick(&mut frame, tick) {
            Ok(TickOutcome::Continue) => StartupProgress::Running,
            Ok(TickOutcome::Finished) => {
                info!("Startup sequence complete");
                self.active = None;
                StartupProgress::Completed
            }
            Err(e) => {
                let failure = CoreError::RoutineFailure {
                    id: active.id.clone(),
                    reason: e.0,
                };
                warn!("Startup sequence failed: {}", failure);
                self.active = None;
                sink.blackout();
                StartupProgress::Completed
            }
        }
    }
}
