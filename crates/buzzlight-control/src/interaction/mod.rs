//! Gesture feedback state machine
//!
//! Every gesture (with reactive mode on) replaces the interaction task,
//! whatever is playing. The scheduler cancels the background task as part
//! of starting it. Media keys are a separate side channel that works even
//! with reactive mode off.

mod animations;

pub use animations::{ClickFlash, ReleaseFade, TouchHold, Wipe, WipeDirection};

use crate::gesture::{Direction, Gesture};
use crate::media::{MediaKey, MediaKeyEmitter};
use buzzlight_core::{Animation, Scheduler, Settings, TaskEvent, TaskKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Current interaction feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InteractionState {
    #[default]
    Idle,
    WipeRight,
    WipeLeft,
    TouchHold,
    ReleaseFade,
    ClickFlash,
}

impl InteractionState {
    /// Name used for the scheduled task
    pub fn label(self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::WipeRight => "wipe_right",
            InteractionState::WipeLeft => "wipe_left",
            InteractionState::TouchHold => "touch_hold",
            InteractionState::ReleaseFade => "release_fade",
            InteractionState::ClickFlash => "click_flash",
        }
    }

    /// Frame interval at 100% speed
    pub fn base_interval_ms(self) -> u64 {
        match self {
            InteractionState::Idle => 0,
            InteractionState::WipeRight | InteractionState::WipeLeft => 25,
            InteractionState::TouchHold | InteractionState::ClickFlash => 20,
            InteractionState::ReleaseFade => 18,
        }
    }

    /// Fresh animation for this state; `None` for idle
    pub fn routine(self) -> Option<Box<dyn Animation>> {
        let routine: Box<dyn Animation> = match self {
            InteractionState::Idle => return None,
            InteractionState::WipeRight => Box::new(Wipe::new(WipeDirection::Rightward)),
            InteractionState::WipeLeft => Box::new(Wipe::new(WipeDirection::Leftward)),
            InteractionState::TouchHold => Box::new(TouchHold),
            InteractionState::ReleaseFade => Box::new(ReleaseFade),
            InteractionState::ClickFlash => Box::new(ClickFlash),
        };
        Some(routine)
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gesture to state; knob direction is mirrored for the visual
pub fn transition_for(gesture: Gesture) -> InteractionState {
    match gesture {
        Gesture::KnobDelta(Direction::Positive) => InteractionState::WipeLeft,
        Gesture::KnobDelta(Direction::Negative) => InteractionState::WipeRight,
        Gesture::TouchChanged(true) => InteractionState::TouchHold,
        Gesture::TouchChanged(false) => InteractionState::ReleaseFade,
        Gesture::ClickEdge => InteractionState::ClickFlash,
    }
}

/// Media key for a gesture, if it has one
pub fn media_key_for(gesture: Gesture) -> Option<MediaKey> {
    match gesture {
        Gesture::KnobDelta(Direction::Positive) => Some(MediaKey::NextTrack),
        Gesture::KnobDelta(Direction::Negative) => Some(MediaKey::PreviousTrack),
        Gesture::ClickEdge => Some(MediaKey::PlayPause),
        Gesture::TouchChanged(_) => None,
    }
}

/// Maps gestures to interaction tasks and media keys
pub struct InteractionEngine {
    state: InteractionState,
    media: Box<dyn MediaKeyEmitter>,
}

impl InteractionEngine {
    pub fn new(media: Box<dyn MediaKeyEmitter>) -> Self {
        Self {
            state: InteractionState::Idle,
            media,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// React to one gesture
    ///
    /// Returns the new state when an interaction task was started.
    pub fn handle(
        &mut self,
        gesture: Gesture,
        settings: &Settings,
        scheduler: &mut Scheduler,
        now: Instant,
    ) -> Option<InteractionState> {
        if settings.media_enabled {
            if let Some(key) = media_key_for(gesture) {
                if let Err(e) = self.media.press(key) {
                    warn!("Media key {:?} failed: {}", key, e);
                }
            }
        }

        if !settings.reactive_mode_enabled {
            return None;
        }

        let next = transition_for(gesture);
        let routine = next.routine()?;
        debug!("Interaction {} -> {}", self.state, next);
        scheduler.start(
            TaskKind::Interaction,
            next.label(),
            next.base_interval_ms(),
            routine,
            now,
        );
        self.state = next;
        Some(next)
    }

    /// Track interaction tasks ending on their own; returns whether the state changed
    pub fn on_task_event(&mut self, event: &TaskEvent) -> bool {
        if event.kind() != TaskKind::Interaction || self.state == InteractionState::Idle {
            return false;
        }
        self.state = InteractionState::Idle;
        true
    }

    /// Forget the current state after the interaction task was cancelled externally
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }
}

impl fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMediaKeys;
    use buzzlight_core::SettingsHandle;

    fn settings(reactive: bool, media: bool) -> Settings {
        Settings {
            reactive_mode_enabled: reactive,
            media_enabled: media,
            ..Settings::default()
        }
    }

    #[test]
    fn test_transition_table() {
        use Direction::*;
        assert_eq!(transition_for(Gesture::KnobDelta(Positive)), InteractionState::WipeLeft);
        assert_eq!(transition_for(Gesture::KnobDelta(Negative)), InteractionState::WipeRight);
        assert_eq!(transition_for(Gesture::TouchChanged(true)), InteractionState::TouchHold);
        assert_eq!(transition_for(Gesture::TouchChanged(false)), InteractionState::ReleaseFade);
        assert_eq!(transition_for(Gesture::ClickEdge), InteractionState::ClickFlash);
    }

    #[test]
    fn test_disabled_reactive_mode_is_noop() {
        let keys = RecordingMediaKeys::new();
        let mut engine = InteractionEngine::new(Box::new(keys.clone()));
        let mut scheduler = Scheduler::new(SettingsHandle::default());

        let result = engine.handle(
            Gesture::ClickEdge,
            &settings(false, false),
            &mut scheduler,
            Instant::now(),
        );

        assert_eq!(result, None);
        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(!scheduler.is_running(TaskKind::Interaction));
        assert!(keys.pressed().is_empty());
    }

    #[test]
    fn test_media_keys_fire_without_reactive_mode() {
        let keys = RecordingMediaKeys::new();
        let mut engine = InteractionEngine::new(Box::new(keys.clone()));
        let mut scheduler = Scheduler::new(SettingsHandle::default());
        let now = Instant::now();
        let media_only = settings(false, true);

        engine.handle(Gesture::KnobDelta(Direction::Positive), &media_only, &mut scheduler, now);
        engine.handle(Gesture::KnobDelta(Direction::Negative), &media_only, &mut scheduler, now);
        engine.handle(Gesture::TouchChanged(true), &media_only, &mut scheduler, now);
        engine.handle(Gesture::ClickEdge, &media_only, &mut scheduler, now);

        assert_eq!(
            keys.pressed(),
            vec![MediaKey::NextTrack, MediaKey::PreviousTrack, MediaKey::PlayPause]
        );
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[test]
    fn test_every_gesture_preempts() {
        let mut engine = InteractionEngine::new(Box::new(RecordingMediaKeys::new()));
        let mut scheduler = Scheduler::new(SettingsHandle::default());
        let now = Instant::now();
        let reactive = settings(true, false);

        engine.handle(Gesture::KnobDelta(Direction::Negative), &reactive, &mut scheduler, now);
        assert_eq!(
            scheduler.task(TaskKind::Interaction).unwrap().label,
            "wipe_right"
        );

        engine.handle(Gesture::ClickEdge, &reactive, &mut scheduler, now);
        assert_eq!(engine.state(), InteractionState::ClickFlash);
        assert_eq!(scheduler.live_tasks(), 1);
        assert_eq!(
            scheduler.task(TaskKind::Interaction).unwrap().label,
            "click_flash"
        );
    }

    #[test]
    fn test_completion_returns_to_idle() {
        let mut engine = InteractionEngine::new(Box::new(RecordingMediaKeys::new()));
        let mut scheduler = Scheduler::new(SettingsHandle::default());
        engine.handle(Gesture::TouchChanged(false), &settings(true, false), &mut scheduler, Instant::now());

        let background_done = TaskEvent::Completed {
            kind: TaskKind::Background,
            label: "fire".to_string(),
        };
        assert!(!engine.on_task_event(&background_done));

        let done = TaskEvent::Completed {
            kind: TaskKind::Interaction,
            label: "release_fade".to_string(),
        };
        assert!(engine.on_task_event(&done));
        assert_eq!(engine.state(), InteractionState::Idle);
        assert!(!engine.on_task_event(&done));
    }
}
