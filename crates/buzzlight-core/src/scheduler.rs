//! Periodic task scheduling
//!
//! The scheduler owns at most one task per [`TaskKind`]. Starting a task
//! cancels the previous one of the same kind before anything else happens,
//! so its routine never sees another tick. Starting an interaction task
//! additionally cancels the background task: a gesture always takes over
//! the lights.
//!
//! Time is passed in explicitly. The caller sleeps until
//! [`Scheduler::next_deadline`] and then calls [`Scheduler::poll`].

use crate::animation::{Animation, Frame, TickOutcome};
use crate::error::CoreError;
use crate::settings::SettingsHandle;
use crate::sink::ColorSink;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Floor for any effective tick interval, in milliseconds
pub const MIN_INTERVAL_MS: f64 = 10.0;

/// `max(10ms, base / (speed / 100))`
pub fn effective_interval(base_interval_ms: u64, speed_percent: u32) -> Duration {
    let factor = f64::from(speed_percent.max(1)) / 100.0;
    let ms = (base_interval_ms as f64 / factor).max(MIN_INTERVAL_MS);
    Duration::from_micros((ms * 1000.0).round() as u64)
}

/// The two independently exclusive task slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// User-selected looping animation
    Background,
    /// Short gesture feedback animation
    Interaction,
}

/// Fixed-rate tick source without catch-up bursts
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    interval: Duration,
    next_due: Instant,
    tick: u64,
}

impl PeriodicTimer {
    /// First tick falls one interval after `now`
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
            tick: 0,
        }
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next tick is due
    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    /// Ticks consumed so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether a tick is due at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Consume the current tick number and schedule the next one
    ///
    /// If the caller fell behind by more than one interval the backlog is
    /// dropped instead of replayed.
    pub fn advance(&mut self, now: Instant) -> u64 {
        let tick = self.tick;
        self.tick += 1;
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        tick
    }
}

struct ScheduledTask {
    label: String,
    routine: Box<dyn Animation>,
    timer: PeriodicTimer,
}

/// Snapshot of a live task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    /// Slot the task occupies
    pub kind: TaskKind,
    /// Animation id or interaction name
    pub label: String,
    /// Effective tick interval
    pub interval: Duration,
    /// Ticks delivered so far
    pub ticks: u64,
}

/// Something that ended a task during [`Scheduler::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// The routine reported it was finished
    Completed {
        /// Slot that is now idle
        kind: TaskKind,
        /// Label of the finished task
        label: String,
    },
    /// The routine failed and the task stopped itself
    Failed {
        /// Slot that is now idle
        kind: TaskKind,
        /// Label of the failed task
        label: String,
        /// Failure description
        reason: String,
    },
}

impl TaskEvent {
    /// Slot the event refers to
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Completed { kind, .. } | Self::Failed { kind, .. } => *kind,
        }
    }
}

/// Owner of the background and interaction tasks
pub struct Scheduler {
    settings: SettingsHandle,
    background: Option<ScheduledTask>,
    interaction: Option<ScheduledTask>,
}

impl Scheduler {
    /// Create an idle scheduler reading speed from `settings`
    pub fn new(settings: SettingsHandle) -> Self {
        Self {
            settings,
            background: None,
            interaction: None,
        }
    }

    fn slot_mut(&mut self, kind: TaskKind) -> &mut Option<ScheduledTask> {
        match kind {
            TaskKind::Background => &mut self.background,
            TaskKind::Interaction => &mut self.interaction,
        }
    }

    fn slot(&self, kind: TaskKind) -> Option<&ScheduledTask> {
        match kind {
            TaskKind::Background => self.background.as_ref(),
            TaskKind::Interaction => self.interaction.as_ref(),
        }
    }

    /// Start a task, replacing whatever held the slot
    ///
    /// The interval is `effective_interval(base_interval_ms, speed)` with the
    /// speed read now. An interaction start also cancels the background task.
    /// The tick counter starts at 0.
    pub fn start(
        &mut self,
        kind: TaskKind,
        label: impl Into<String>,
        base_interval_ms: u64,
        routine: Box<dyn Animation>,
        now: Instant,
    ) {
        let label = label.into();
        if kind == TaskKind::Interaction {
            self.cancel(TaskKind::Background);
        }
        self.cancel(kind);

        let speed = self.settings.scaling().speed_percent;
        let interval = effective_interval(base_interval_ms, speed);
        match kind {
            TaskKind::Background => info!(
                "Starting {} @ {:.1}ms (speed: {}%)",
                label,
                interval.as_secs_f64() * 1000.0,
                speed
            ),
            TaskKind::Interaction => debug!(
                "Interaction {} @ {:.1}ms",
                label,
                interval.as_secs_f64() * 1000.0
            ),
        }

        *self.slot_mut(kind) = Some(ScheduledTask {
            label,
            routine,
            timer: PeriodicTimer::new(interval, now),
        });
    }

    /// Stop the task in `kind`; returns whether one was running
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        match self.slot_mut(kind).take() {
            Some(task) => {
                debug!("Cancelled {:?} task {}", kind, task.label);
                true
            }
            None => false,
        }
    }

    /// Stop both tasks
    pub fn cancel_all(&mut self) {
        self.cancel(TaskKind::Interaction);
        self.cancel(TaskKind::Background);
    }

    /// Whether a task occupies `kind`
    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.slot(kind).is_some()
    }

    /// Details of the task in `kind`
    pub fn task(&self, kind: TaskKind) -> Option<TaskInfo> {
        self.slot(kind).map(|task| TaskInfo {
            kind,
            label: task.label.clone(),
            interval: task.timer.interval(),
            ticks: task.timer.tick_count(),
        })
    }

    /// Number of live tasks
    pub fn live_tasks(&self) -> usize {
        usize::from(self.background.is_some()) + usize::from(self.interaction.is_some())
    }

    /// Earliest pending tick across both slots
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.background.as_ref(), self.interaction.as_ref()]
            .into_iter()
            .flatten()
            .map(|task| task.timer.next_due())
            .min()
    }

    /// Run every due tick once
    ///
    /// A routine error stops that task only; it is logged and reported as
    /// [`TaskEvent::Failed`].
    pub fn poll(&mut self, now: Instant, sink: &mut ColorSink) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        for kind in [TaskKind::Background, TaskKind::Interaction] {
            let slot = self.slot_mut(kind);
            let Some(task) = slot.as_mut() else {
                continue;
            };
            if !task.timer.is_due(now) {
                continue;
            }

            let tick = task.timer.advance(now);
            let mut frame = Frame::new(sink);
            match task.routine.tick(&mut frame, tick) {
                Ok(TickOutcome::Continue) => {}
                Ok(TickOutcome::Finished) => {
                    debug!("{:?} task {} finished after {} ticks", kind, task.label, tick + 1);
                    let label = task.label.clone();
                    *slot = None;
                    events.push(TaskEvent::Completed { kind, label });
                }
                Err(e) => {
                    let label = task.label.clone();
                    *slot = None;
                    error!(
                        "{}",
                        CoreError::RoutineFailure {
                            id: label.clone(),
                            reason: e.0.clone(),
                        }
                    );
                    events.push(TaskEvent::Failed {
                        kind,
                        label,
                        reason: e.0,
                    });
                }
            }
        }
        events
    }
}
