//! Settings record, live snapshot handle and JSON persistence
//!
//! The engine timeline is the only writer. Everything else reads the current
//! snapshot through [`SettingsHandle::load`] on each use, so a change takes
//! effect on the next tick without anyone holding a stale copy.

use crate::error::{CoreError, Result};
use crate::logging::LogConfig;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lowest accepted speed percentage
pub const MIN_SPEED_PERCENT: u32 = 10;
/// Highest accepted speed percentage
pub const MAX_SPEED_PERCENT: u32 = 200;
/// Highest accepted brightness percentage
pub const MAX_BRIGHTNESS_PERCENT: u32 = 100;

/// Which device to talk to and on which logical channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Case-insensitive substring matched against port names
    #[serde(default = "default_name_filter")]
    pub name_filter: String,
    /// Channel (0-15) gesture messages arrive on
    #[serde(default = "default_channel")]
    pub input_channel: u8,
    /// Channel (0-15) color writes are sent on
    #[serde(default = "default_channel")]
    pub output_channel: u8,
}

fn default_name_filter() -> String {
    "TimeBuzzer".to_string()
}

fn default_channel() -> u8 {
    11
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_filter: default_name_filter(),
            input_channel: default_channel(),
            output_channel: default_channel(),
        }
    }
}

/// The persisted flat settings record
///
/// Older config files used `ledEnabled`, `brightness` and `globalSpeed`;
/// those keys are still accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Gestures drive interaction animations
    #[serde(default, alias = "ledEnabled")]
    pub reactive_mode_enabled: bool,
    /// Gestures emit media keys
    #[serde(default)]
    pub media_enabled: bool,
    /// Output brightness, 0-100
    #[serde(default = "default_percent", alias = "brightness")]
    pub brightness_percent: u32,
    /// Animation speed, 10-200 (percent of base speed)
    #[serde(default = "default_percent", alias = "globalSpeed")]
    pub speed_percent: u32,
    /// Device selection
    #[serde(default)]
    pub device: DeviceConfig,
    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

fn default_percent() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reactive_mode_enabled: false,
            media_enabled: false,
            brightness_percent: 100,
            speed_percent: 100,
            device: DeviceConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Settings {
    /// Clamp percentages into their accepted ranges
    pub fn normalize(&mut self) {
        self.brightness_percent = self.brightness_percent.min(MAX_BRIGHTNESS_PERCENT);
        self.speed_percent = self
            .speed_percent
            .clamp(MIN_SPEED_PERCENT, MAX_SPEED_PERCENT);
        self.device.input_channel &= 0x0F;
        self.device.output_channel &= 0x0F;
    }

    /// Return a normalized copy
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// The scaling view used by the scheduler and the sink
    pub fn scaling(&self) -> ScalingConfig {
        ScalingConfig {
            brightness_percent: self.brightness_percent,
            speed_percent: self.speed_percent,
        }
    }
}

/// Brightness and speed, read on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingConfig {
    /// Output brightness, 0-100
    pub brightness_percent: u32,
    /// Animation speed, 10-200
    pub speed_percent: u32,
}

impl ScalingConfig {
    /// Brightness as a multiplier (1.0 = unchanged)
    pub fn brightness_factor(&self) -> f32 {
        self.brightness_percent as f32 / 100.0
    }
}

/// Partial update merged into the current settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New reactive mode flag
    #[serde(default, alias = "ledEnabled")]
    pub reactive_mode_enabled: Option<bool>,
    /// New media flag
    #[serde(default)]
    pub media_enabled: Option<bool>,
    /// New brightness
    #[serde(default, alias = "brightness")]
    pub brightness_percent: Option<u32>,
    /// New speed
    #[serde(default, alias = "globalSpeed")]
    pub speed_percent: Option<u32>,
}

impl SettingsPatch {
    /// Patch changing only the brightness
    pub fn brightness(percent: u32) -> Self {
        Self {
            brightness_percent: Some(percent),
            ..Self::default()
        }
    }

    /// Patch changing only the speed
    pub fn speed(percent: u32) -> Self {
        Self {
            speed_percent: Some(percent),
            ..Self::default()
        }
    }

    /// Merge into `settings`
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(enabled) = self.reactive_mode_enabled {
            settings.reactive_mode_enabled = enabled;
        }
        if let Some(enabled) = self.media_enabled {
            settings.media_enabled = enabled;
        }
        if let Some(brightness) = self.brightness_percent {
            settings.brightness_percent = brightness;
        }
        if let Some(speed) = self.speed_percent {
            settings.speed_percent = speed;
        }
        settings.normalize();
    }

    /// Whether applying this patch changes the speed of `current`
    pub fn changes_speed(&self, current: &Settings) -> bool {
        self.speed_percent.is_some_and(|speed| {
            speed.clamp(MIN_SPEED_PERCENT, MAX_SPEED_PERCENT) != current.speed_percent
        })
    }
}

/// Shared handle to the current settings snapshot
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<ArcSwap<Settings>>,
}

impl SettingsHandle {
    /// Wrap `settings` (normalized) in a new handle
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings.normalized())),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<Settings> {
        self.inner.load_full()
    }

    /// Current brightness and speed
    pub fn scaling(&self) -> ScalingConfig {
        self.inner.load().scaling()
    }

    /// Replace the snapshot with a modified copy and return it
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Arc<Settings> {
        let mut next = Settings::clone(&self.inner.load());
        f(&mut next);
        next.normalize();
        let next = Arc::new(next);
        self.inner.store(Arc::clone(&next));
        next
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SettingsHandle")
            .field(&*self.inner.load())
            .finish()
    }
}

/// Loads and saves [`Settings`] as pretty JSON
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Option<PathBuf>,
}

impl SettingsStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store in the user config directory, if there is one
    pub fn at_default_location() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self { path: None }
    }

    /// `<config dir>/Buzzlight/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("Buzzlight").join("config.json"))
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load settings, surfacing read and parse failures
    ///
    /// A missing file is not an error; it yields defaults.
    pub fn try_load(&self) -> Result<Settings> {
        let Some(path) = &self.path else {
            return Ok(Settings::default());
        };
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        Ok(settings.normalized())
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                info!("Config loaded: {:?}", settings.scaling());
                settings
            }
            Err(e) => {
                warn!("Failed to load config, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Write settings to disk, creating the parent directory
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(path, content)?;
        debug!("Saved config to {:?}", path);
        Ok(())
    }
}
