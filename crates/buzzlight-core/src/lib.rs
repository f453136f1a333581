//! Buzzlight Core - Animation Scheduling and Color Output
//!
//! This crate contains the device-independent half of Buzzlight:
//! - **Color output**: brightness scaling and range clamping per zone
//! - **Animations**: the routine abstraction, built-in catalog and manifests
//! - **Scheduler**: one background and one interaction task, cancel-before-start
//! - **Startup**: the one-shot welcome sweep played on connection
//! - **Settings**: the persisted flat settings record and its live snapshot
//!
//! ## Quick Start
//!
//! ```rust
//! use buzzlight_core::{default_zones, AnimationRegistry, ColorSink, Scheduler, SettingsHandle, TaskKind};
//! use std::time::Instant;
//!
//! let settings = SettingsHandle::default();
//! let mut sink = ColorSink::new(default_zones(), 11, settings.clone());
//! let registry = AnimationRegistry::with_builtins();
//! let mut scheduler = Scheduler::new(settings);
//!
//! let rainbow = registry.get("rainbow").unwrap();
//! scheduler.start(
//!     TaskKind::Background,
//!     rainbow.id.clone(),
//!     rainbow.base_interval_ms,
//!     rainbow.instantiate(),
//!     Instant::now(),
//! );
//! scheduler.poll(Instant::now(), &mut sink);
//! ```

#![warn(missing_docs)]

/// Routine trait and the per-tick output surface
pub mod animation;
/// Color values and channel clamping
pub mod color;
/// Error types
pub mod error;
/// Logging configuration
pub mod logging;
/// JSON routine manifests
pub mod manifest;
/// Animation catalog with refreshable sources
pub mod registry;
/// Built-in background routines
pub mod routines;
/// Periodic task scheduling
pub mod scheduler;
/// Persisted settings and live snapshots
pub mod settings;
/// Brightness scaling and protocol writes
pub mod sink;
/// One-shot connection animation
pub mod startup;
/// Test doubles for transports
pub mod testing;
/// Lighting zones
pub mod zone;

pub use animation::{Animation, FnRoutine, Frame, RoutineError, TickOutcome};
pub use color::{clamp_level, lerp, Color, CHANNEL_MAX};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
pub use manifest::{ManifestDirSource, ProceduralRoutine, RoutineManifest};
pub use registry::{
    AnimationDescriptor, AnimationRegistry, RefreshReport, RoutineSource, SkippedRoutine,
};
pub use routines::BuiltinSource;
pub use scheduler::{
    effective_interval, PeriodicTimer, Scheduler, TaskEvent, TaskInfo, TaskKind, MIN_INTERVAL_MS,
};
pub use settings::{
    DeviceConfig, ScalingConfig, Settings, SettingsHandle, SettingsPatch, SettingsStore,
};
pub use sink::{ColorSink, ControlOutput};
pub use startup::{StartupProgress, StartupSequence, WelcomeSweep, STARTUP_ID};
pub use zone::{default_zones, ChannelMap, Zone};
