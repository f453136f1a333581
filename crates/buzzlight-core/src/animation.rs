//! The routine abstraction shared by background, interaction and startup animations

use crate::color::Color;
use crate::sink::ColorSink;
use thiserror::Error;

/// Whether a routine wants more ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking
    Continue,
    /// The routine reached its frame bound; its task should end
    Finished,
}

/// Failure raised by a routine during one tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RoutineError(pub String);

/// The per-tick output surface handed to routines
///
/// Writes go straight through to the sink, which applies brightness and
/// clamping.
pub struct Frame<'a> {
    sink: &'a mut ColorSink,
}

impl<'a> Frame<'a> {
    /// Wrap a sink for one tick
    pub fn new(sink: &'a mut ColorSink) -> Self {
        Self { sink }
    }

    /// Number of zones, indexed `0..zone_count()`
    pub fn zone_count(&self) -> usize {
        self.sink.zone_count()
    }

    /// Set one zone
    pub fn set(&mut self, zone: usize, color: Color) {
        self.sink.emit(zone, color);
    }

    /// Set every zone to the same color
    pub fn fill(&mut self, color: Color) {
        self.sink.set_all(color);
    }
}

/// A color generator driven by a periodic tick
///
/// `tick` counts from 0 for the lifetime of one scheduled task. A routine
/// must not block and is the only producer of color for that tick.
pub trait Animation: Send {
    /// Render one tick
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError>;
}

/// Adapts a plain function into a never-ending [`Animation`]
#[derive(Clone, Copy)]
pub struct FnRoutine(pub fn(&mut Frame<'_>, u64));

impl Animation for FnRoutine {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> Result<TickOutcome, RoutineError> {
        (self.0)(frame, tick);
        Ok(TickOutcome::Continue)
    }
}
