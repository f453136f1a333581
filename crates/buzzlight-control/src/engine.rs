//! The lighting engine: one task owning every piece of mutable state
//!
//! Raw port messages and user commands arrive on channels and are handled
//! one at a time between ticks, so gesture state, settings writes and the
//! scheduler never see concurrent access. Status changes are broadcast to
//! any number of observers.

use crate::error::{ControlError, Result};
use crate::gesture::{GestureDecoder, GestureMap};
use crate::interaction::{InteractionEngine, InteractionState};
use crate::media::MediaKeyEmitter;
use crate::midi::{ControlChange, RawMessage};
use buzzlight_core::{
    AnimationRegistry, Color, ColorSink, RefreshReport, Scheduler, Settings, SettingsHandle,
    SettingsPatch, SettingsStore, StartupProgress, StartupSequence, TaskKind, STARTUP_ID,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;
const COMMAND_CAPACITY: usize = 32;

/// Something observers may want to show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    Connecting,
    Connected { input: String, output: String },
    Initializing,
    Ready,
    /// Raw control change on the input channel, for visualisation
    ControlActivity { controller: u8, value: u8 },
    ConfigUpdated { settings: Settings },
    AnimationStarted { id: String },
    AnimationStopped,
    InteractionChanged { state: InteractionState },
}

/// Requests accepted by a running engine
#[derive(Debug)]
pub enum EngineCommand {
    StartAnimation(String),
    StopAnimation,
    EnableReactiveMode,
    ManualColor(Color),
    UpdateSettings(SettingsPatch),
    RunStartup,
    ListAnimations(oneshot::Sender<Vec<(String, String)>>),
    RefreshAnimations(oneshot::Sender<RefreshReport>),
    Shutdown,
}

/// Owner of the scheduler, sink, decoder and settings
pub struct LightingEngine {
    settings: SettingsHandle,
    store: SettingsStore,
    registry: AnimationRegistry,
    scheduler: Scheduler,
    sink: ColorSink,
    startup: StartupSequence,
    decoder: GestureDecoder,
    interaction: InteractionEngine,
    active_background: Option<String>,
    events: broadcast::Sender<StatusEvent>,
}

impl LightingEngine {
    pub fn new(
        settings: SettingsHandle,
        store: SettingsStore,
        registry: AnimationRegistry,
        sink: ColorSink,
        media: Box<dyn MediaKeyEmitter>,
    ) -> Self {
        let input_channel = settings.load().device.input_channel;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            scheduler: Scheduler::new(settings.clone()),
            settings,
            store,
            registry,
            sink,
            startup: StartupSequence::new(),
            decoder: GestureDecoder::new(GestureMap::new(input_channel)),
            interaction: InteractionEngine::new(media),
            active_background: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    /// Broadcast an event; having no observers is fine
    pub fn notify(&self, event: StatusEvent) {
        let _ = self.events.send(event);
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.load()
    }

    pub fn sink(&self) -> &ColorSink {
        &self.sink
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    /// Id of the background animation a speed change would restart
    pub fn active_background(&self) -> Option<&str> {
        self.active_background.as_deref()
    }

    pub fn is_starting_up(&self) -> bool {
        self.startup.is_running()
    }

    fn persist(&self, settings: &Settings) {
        if let Err(e) = self.store.save(settings) {
            warn!("Failed to save config: {}", e);
        }
        self.notify(StatusEvent::ConfigUpdated {
            settings: settings.clone(),
        });
    }

    fn set_reactive_mode(&mut self, enabled: bool) {
        if self.settings.load().reactive_mode_enabled == enabled {
            return;
        }
        let updated = self.settings.update(|s| s.reactive_mode_enabled = enabled);
        self.persist(&updated);
    }

    /// Cut the welcome sweep short; observers still see it finish
    fn abort_startup(&mut self) {
        if self.startup.abort() {
            self.notify(StatusEvent::Ready);
        }
    }

    fn clear_interaction(&mut self) {
        if self.scheduler.cancel(TaskKind::Interaction) {
            self.interaction.reset();
            self.notify(StatusEvent::InteractionChanged {
                state: InteractionState::Idle,
            });
        }
    }

    /// Handle one raw port message
    pub fn handle_raw(&mut self, bytes: &[u8], now: Instant) {
        let Some(message) = ControlChange::from_bytes(bytes) else {
            return;
        };
        if message.channel == self.decoder.map().channel {
            self.notify(StatusEvent::ControlActivity {
                controller: message.controller,
                value: message.value,
            });
        }

        let Some(gesture) = self.decoder.decode(&message) else {
            return;
        };
        debug!("Gesture: {:?}", gesture);

        let settings = self.settings.load();
        if let Some(state) = self
            .interaction
            .handle(gesture, &settings, &mut self.scheduler, now)
        {
            self.abort_startup();
            if self.active_background.take().is_some() {
                self.notify(StatusEvent::AnimationStopped);
            }
            self.notify(StatusEvent::InteractionChanged { state });
        }
    }

    fn launch_background(&mut self, id: &str, now: Instant) -> Result<String> {
        let descriptor = self.registry.get(id)?;
        let routine = descriptor.instantiate();
        let id = descriptor.id.clone();
        self.scheduler.start(
            TaskKind::Background,
            id.clone(),
            descriptor.base_interval_ms,
            routine,
            now,
        );
        Ok(id)
    }

    /// Start a background animation by id
    ///
    /// Sources are rescanned first so newly added routines can be started.
    /// Reactive mode is switched off. An unknown id changes nothing.
    pub fn start_animation(&mut self, id: &str, now: Instant) -> Result<()> {
        self.registry.refresh();
        if !self.registry.contains(id) || id == STARTUP_ID {
            warn!("Animation {} not found!", id);
            return Err(buzzlight_core::CoreError::UnknownAnimation(id.to_string()).into());
        }

        self.abort_startup();
        self.clear_interaction();
        let id = self.launch_background(id, now)?;
        self.active_background = Some(id.clone());
        self.set_reactive_mode(false);
        self.notify(StatusEvent::AnimationStarted { id });
        Ok(())
    }

    /// Stop the background animation; returns whether one was running
    pub fn stop_animation(&mut self) -> bool {
        self.active_background = None;
        let stopped = self.scheduler.cancel(TaskKind::Background);
        if stopped {
            self.notify(StatusEvent::AnimationStopped);
        }
        stopped
    }

    /// Stop any background animation and let gestures drive the lights
    pub fn enable_reactive_mode(&mut self) {
        self.stop_animation();
        self.set_reactive_mode(true);
    }

    /// Show a fixed color until something else takes over
    pub fn manual_color(&mut self, color: Color) {
        self.stop_animation();
        self.abort_startup();
        self.clear_interaction();
        self.set_reactive_mode(false);
        self.sink.set_all(color);
    }

    /// Merge and persist a settings change
    ///
    /// A speed change restarts the active background animation so its new
    /// interval applies. A running interaction keeps its cadence.
    pub fn update_settings(&mut self, patch: SettingsPatch, now: Instant) {
        let restart = patch.changes_speed(&self.settings.load());
        let updated = self.settings.update(|s| patch.apply(s));
        info!("Config updated: {:?}", updated.scaling());
        self.persist(&updated);

        if !restart {
            return;
        }
        if let Some(id) = self.active_background.clone() {
            if let Err(e) = self.launch_background(&id, now) {
                warn!("Could not restart {}: {}", id, e);
                self.stop_animation();
            }
        }
    }

    /// Play the welcome sweep; returns whether it started
    pub fn run_startup(&mut self, now: Instant) -> bool {
        if !self.sink.is_connected() {
            debug!("No output, skipping startup sequence");
            return false;
        }
        let Ok(descriptor) = self.registry.get(STARTUP_ID) else {
            warn!("Startup sequence not registered");
            return false;
        };
        let started = self.startup.begin(descriptor, now);
        if started {
            self.notify(StatusEvent::Initializing);
        }
        started
    }

    pub fn list_animations(&self) -> Vec<(String, String)> {
        self.registry.list()
    }

    pub fn refresh_animations(&mut self) -> RefreshReport {
        self.registry.refresh()
    }

    /// Earliest pending frame across startup and both task slots
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.startup.next_deadline(), self.scheduler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Render every due frame
    pub fn poll(&mut self, now: Instant) {
        if self.startup.poll(now, &mut self.sink) == StartupProgress::Completed {
            self.notify(StatusEvent::Ready);
        }

        for event in self.scheduler.poll(now, &mut self.sink) {
            if event.kind() == TaskKind::Background && self.active_background.take().is_some() {
                self.notify(StatusEvent::AnimationStopped);
            }
            if self.interaction.on_task_event(&event) {
                self.notify(StatusEvent::InteractionChanged {
                    state: self.interaction.state(),
                });
            }
        }
    }

    /// Stop everything and turn every zone off
    pub fn shutdown(&mut self) {
        info!("Shutting down lighting engine");
        self.scheduler.cancel_all();
        self.startup.abort();
        self.interaction.reset();
        self.active_background = None;
        self.sink.blackout();
    }

    fn handle_command(&mut self, command: EngineCommand, now: Instant) {
        match command {
            EngineCommand::StartAnimation(id) => {
                // Already logged; nothing else to do for an unknown id
                let _ = self.start_animation(&id, now);
            }
            EngineCommand::StopAnimation => {
                self.stop_animation();
            }
            EngineCommand::EnableReactiveMode => self.enable_reactive_mode(),
            EngineCommand::ManualColor(color) => self.manual_color(color),
            EngineCommand::UpdateSettings(patch) => self.update_settings(patch, now),
            EngineCommand::RunStartup => {
                self.run_startup(now);
            }
            EngineCommand::ListAnimations(reply) => {
                let _ = reply.send(self.list_animations());
            }
            EngineCommand::RefreshAnimations(reply) => {
                let _ = reply.send(self.refresh_animations());
            }
            EngineCommand::Shutdown => self.shutdown(),
        }
    }

    /// Drive the engine until a shutdown command or all handles are dropped
    ///
    /// Zones are blanked before this returns.
    pub async fn run(
        mut self,
        mut messages: mpsc::UnboundedReceiver<RawMessage>,
        mut commands: mpsc::Receiver<EngineCommand>,
    ) {
        info!("Lighting engine running");
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                Some(message) = messages.recv() => self.handle_raw(&message, now()),
                command = commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command, now()),
                },
                _ = sleep_until(deadline) => self.poll(now()),
            }
        }
        self.shutdown();
    }

    /// Run on a new tokio task
    pub fn spawn(self, messages: mpsc::UnboundedReceiver<RawMessage>) -> (EngineHandle, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(COMMAND_CAPACITY);
        let handle = EngineHandle {
            commands,
            events: self.events.clone(),
        };
        let task = tokio::spawn(self.run(messages, receiver));
        (handle, task)
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Cloneable front end to a spawned engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<StatusEvent>,
}

impl EngineHandle {
    pub async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ControlError::EngineStopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub async fn start_animation(&self, id: impl Into<String>) -> Result<()> {
        self.send(EngineCommand::StartAnimation(id.into())).await
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<()> {
        self.send(EngineCommand::UpdateSettings(patch)).await
    }

    pub async fn list_animations(&self) -> Result<Vec<(String, String)>> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::ListAnimations(reply)).await?;
        response.await.map_err(|_| ControlError::EngineStopped)
    }

    pub async fn refresh_animations(&self) -> Result<RefreshReport> {
        let (reply, response) = oneshot::channel();
        self.send(EngineCommand::RefreshAnimations(reply)).await?;
        response.await.map_err(|_| ControlError::EngineStopped)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineCommand::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMediaKeys;
    use buzzlight_core::default_zones;
    use buzzlight_core::testing::RecordingOutput;
    use std::time::Duration;

    fn engine(settings: Settings) -> (LightingEngine, RecordingOutput) {
        let settings = SettingsHandle::new(settings);
        let mut sink = ColorSink::new(default_zones(), 11, settings.clone());
        let output = RecordingOutput::new();
        sink.attach(Box::new(output.clone()));
        let engine = LightingEngine::new(
            settings,
            SettingsStore::in_memory(),
            AnimationRegistry::with_builtins(),
            sink,
            Box::new(RecordingMediaKeys::new()),
        );
        (engine, output)
    }

    fn reactive() -> Settings {
        Settings {
            reactive_mode_enabled: true,
            ..Settings::default()
        }
    }

    #[test]
    fn test_start_animation_disables_reactive_mode() {
        let (mut engine, _) = engine(reactive());
        let mut events = engine.subscribe();

        engine.start_animation("fire", Instant::now()).unwrap();

        assert!(!engine.settings().reactive_mode_enabled);
        assert_eq!(engine.active_background(), Some("fire"));
        assert!(engine.scheduler().is_running(TaskKind::Background));
        assert!(matches!(events.try_recv(), Ok(StatusEvent::ConfigUpdated { .. })));
        assert_eq!(
            events.try_recv().unwrap(),
            StatusEvent::AnimationStarted { id: "fire".to_string() }
        );
    }

    #[test]
    fn test_unknown_animation_changes_nothing() {
        let (mut engine, _) = engine(reactive());
        let t0 = Instant::now();
        engine.start_animation("ice", t0).unwrap();

        assert!(engine.start_animation("nope", t0).is_err());
        assert!(engine.start_animation(STARTUP_ID, t0).is_err());
        assert_eq!(engine.active_background(), Some("ice"));
    }

    #[test]
    fn test_gesture_takes_over_background() {
        let (mut engine, _) = engine(Settings::default());
        let t0 = Instant::now();
        engine.start_animation("rainbow", t0).unwrap();
        engine.update_settings(
            SettingsPatch {
                reactive_mode_enabled: Some(true),
                ..SettingsPatch::default()
            },
            t0,
        );

        engine.handle_raw(&[0xBB, 82, 127], t0);

        assert_eq!(engine.interaction_state(), InteractionState::ClickFlash);
        assert!(!engine.scheduler().is_running(TaskKind::Background));
        assert_eq!(engine.active_background(), None);
        assert!(engine.settings().reactive_mode_enabled);
    }

    #[test]
    fn test_speed_change_restarts_background_only() {
        let (mut engine, _) = engine(Settings::default());
        let t0 = Instant::now();
        engine.start_animation("rainbow", t0).unwrap();

        engine.update_settings(SettingsPatch::speed(200), t0);
        assert_eq!(
            engine.scheduler().task(TaskKind::Background).unwrap().interval,
            Duration::from_millis(25)
        );

        engine.update_settings(SettingsPatch::brightness(40), t0);
        assert_eq!(engine.settings().brightness_percent, 40);
        assert_eq!(
            engine.scheduler().task(TaskKind::Background).unwrap().interval,
            Duration::from_millis(25)
        );
    }

    #[test]
    fn test_manual_color_writes_all_zones() {
        let (mut engine, output) = engine(reactive());
        engine.start_animation("strobe", Instant::now()).unwrap();
        engine.manual_color(Color::new(10, 20, 30));

        assert_eq!(engine.scheduler().live_tasks(), 0);
        assert_eq!(engine.sink().readback(2), Some([10, 20, 30]));
        assert_eq!(output.last_value(78), Some(30));
    }

    #[test]
    fn test_control_activity_is_echoed() {
        let (mut engine, _) = engine(Settings::default());
        let mut events = engine.subscribe();
        engine.handle_raw(&[0xBB, 80, 12], Instant::now());
        engine.handle_raw(&[0xB1, 80, 13], Instant::now());

        assert_eq!(
            events.try_recv().unwrap(),
            StatusEvent::ControlActivity {
                controller: 80,
                value: 12
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_startup_requires_output_and_is_aborted_by_start() {
        let settings = SettingsHandle::default();
        let sink = ColorSink::new(default_zones(), 11, settings.clone());
        let mut detached = LightingEngine::new(
            settings,
            SettingsStore::in_memory(),
            AnimationRegistry::with_builtins(),
            sink,
            Box::new(RecordingMediaKeys::new()),
        );
        assert!(!detached.run_startup(Instant::now()));

        let (mut engine, _) = engine(Settings::default());
        let t0 = Instant::now();
        assert!(engine.run_startup(t0));
        assert!(!engine.run_startup(t0));
        engine.start_animation("wave", t0).unwrap();
        assert!(!engine.is_starting_up());
    }

    #[test]
    fn test_shutdown_blanks_everything() {
        let (mut engine, _) = engine(reactive());
        let t0 = Instant::now();
        engine.handle_raw(&[0xBB, 81, 0], t0);
        engine.poll(t0 + Duration::from_millis(40));
        assert!(!engine.sink().all_off());

        engine.shutdown();
        assert!(engine.sink().all_off());
        assert_eq!(engine.scheduler().live_tasks(), 0);
        assert_eq!(engine.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn test_aborted_startup_still_reports_ready() {
        let (mut engine, _) = engine(reactive());
        let mut events = engine.subscribe();
        let t0 = Instant::now();
        assert!(engine.run_startup(t0));

        engine.handle_raw(&[0xBB, 82, 127], t0);

        let seen: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(seen.first(), Some(&StatusEvent::Initializing));
        assert_eq!(seen.iter().filter(|e| **e == StatusEvent::Ready).count(), 1);
        assert!(!engine.is_starting_up());

        // Nothing left to abort
        engine.manual_color(Color::OFF);
        assert!(!std::iter::from_fn(|| events.try_recv().ok()).any(|e| e == StatusEvent::Ready));
    }

    #[test]
    fn test_status_events_serialize_tagged() {
        let json = serde_json::to_value(StatusEvent::ControlActivity {
            controller: 81,
            value: 0,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "control_activity", "controller": 81, "value": 0})
        );

        let json = serde_json::to_value(StatusEvent::InteractionChanged {
            state: InteractionState::TouchHold,
        })
        .unwrap();
        assert_eq!(json["type"], "interaction_changed");
        assert_eq!(json["state"], "TouchHold");
    }
}
