//! JSON routine manifests
//!
//! A manifest file describes a parameterised procedural routine:
//!
//! ```json
//! {
//!   "name": "Slow Teal",
//!   "interval": 60,
//!   "routine": { "kind": "pulse", "color": { "r": 0, "g": 90, "b": 80 }, "rate": 0.04 }
//! }
//! ```
//!
//! The id defaults to the file stem. [`ManifestDirSource`] loads every
//! `*.json` file in a directory on each registry refresh, so routines can be
//! added without restarting.

use crate::animation::{Animation, Frame, RoutineError, TickOutcome};
use crate::color::Color;
use crate::error::{CoreError, Result};
use crate::registry::{AnimationDescriptor, RoutineSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_interval() -> u64 {
    50
}

/// One manifest file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineManifest {
    /// Animation id; the file stem when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Display name; the id when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Base tick interval in milliseconds
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// What to render
    pub routine: ProceduralRoutine,
}

/// The procedural routine kinds a manifest can describe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProceduralRoutine {
    /// One color breathing on every zone
    Pulse {
        /// Peak color
        color: Color,
        /// Phase advance per tick, in radians
        rate: f32,
    },
    /// Blend through a palette, optionally phase-shifted per zone
    PaletteCycle {
        /// Palette entries, visited in order and wrapping
        colors: Vec<Color>,
        /// Palette steps per tick
        rate: f32,
        /// Palette steps between neighbouring zones
        #[serde(default)]
        zone_offset: f32,
    },
    /// A highlight circling through the zones
    Chase {
        /// Highlight color
        color: Color,
        /// Ticks per lap
        period: u64,
        /// Brightness lost per zone of distance
        #[serde(default = "default_falloff")]
        falloff: f32,
    },
    /// Random dimming of a base color
    Flicker {
        /// Color at full level
        base: Color,
        /// Largest fraction removed per tick, 0..1
        jitter: f32,
    },
}

fn default_falloff() -> f32 {
    1.0
}

impl ProceduralRoutine {
    /// Reject parameters that cannot render
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Pulse { rate, .. } if !rate.is_finite() => Err("rate must be finite".into()),
            Self::PaletteCycle { colors, .. } if colors.is_empty() => {
                Err("palette must not be empty".into())
            }
            Self::PaletteCycle { rate, zone_offset, .. }
                if !rate.is_finite() || !zone_offset.is_finite() =>
            {
                Err("rate and zone_offset must be finite".into())
            }
            Self::Chase { period: 0, .. } => Err("period must be at least 1".into()),
            Self::Flicker { jitter, .. } if !(0.0..=1.0).contains(jitter) => {
                Err("jitter must be within 0..1".into())
            }
            _ => Ok(()),
        }
    }
}

impl RoutineManifest {
    /// Parse a manifest, naming it after `stem` when it has no id
    pub fn parse(stem: &str, content: &str) -> std::result::Result<Self, String> {
        let mut manifest: Self = serde_json::from_str(content).map_err(|e| e.to_string())?;
        if manifest.interval == 0 {
            return Err("interval must be at least 1".into());
        }
        manifest.routine.validate()?;
        if manifest.id.as_deref().map_or(true, str::is_empty) {
            manifest.id = Some(stem.to_string());
        }
        Ok(manifest)
    }

    /// Turn into a registry entry
    pub fn into_descriptor(self) -> AnimationDescriptor {
        let id = self.id.unwrap_or_default();
        let name = self.name.unwrap_or_else(|| id.clone());
        let routine = self.routine;
        AnimationDescriptor::new(id, name, self.interval, move || -> Box<dyn Animation> {
            Box::new(ProceduralAnimation::new(routine.clone()))
        })
    }
}

struct ProceduralAnimation {
    routine: ProceduralRoutine,
    rng: StdRng,
}

impl ProceduralAnimation {
    fn new(routine: ProceduralRoutine) -> Self {
        Self {
            routine,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Animation for ProceduralAnimation {
    fn tick(&mut self, frame: &mut Frame<'_>, tick: u64) -> std::result::Result<TickOutcome, RoutineError> {
        let zones = frame.zone_count();
        match &self.routine {
            ProceduralRoutine::Pulse { color, rate } => {
                let level = ((tick as f32 * rate).sin() + 1.0) / 2.0;
                frame.fill(color.scaled(level));
            }
            ProceduralRoutine::PaletteCycle {
                colors,
                rate,
                zone_offset,
            } => {
                let len = colors.len() as f32;
                for idx in 0..zones {
                    let position = (tick as f32 * rate + idx as f32 * zone_offset).rem_euclid(len);
                    let from = position.floor() as usize % colors.len();
                    let to = (from + 1) % colors.len();
                    frame.set(idx, Color::lerp(colors[from], colors[to], position.fract()));
                }
            }
            ProceduralRoutine::Chase {
                color,
                period,
                falloff,
            } => {
                let count = zones as f32;
                let pos = (tick % period) as f32 / *period as f32 * count;
                for idx in 0..zones {
                    let mut dist = (pos - idx as f32).abs();
                    if dist > count / 2.0 {
                        dist = count - dist;
                    }
                    frame.set(idx, color.scaled((1.0 - dist * falloff).max(0.0)));
                }
            }
            ProceduralRoutine::Flicker { base, jitter } => {
                for idx in 0..zones {
                    let level = 1.0 - self.rng.random::<f32>() * jitter;
                    frame.set(idx, base.scaled(level));
                }
            }
        }
        Ok(TickOutcome::Continue)
    }
}

/// Loads every `*.json` manifest in a directory
#[derive(Debug, Clone)]
pub struct ManifestDirSource {
    dir: PathBuf,
}

impl ManifestDirSource {
    /// Source for `dir`; a missing directory yields no entries
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory scanned
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_file(path: &Path) -> Result<AnimationDescriptor> {
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let malformed = |reason: String| CoreError::MalformedRoutine {
            source_name: source_name.clone(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
        let manifest = RoutineManifest::parse(&stem, &content).map_err(malformed)?;
        Ok(manifest.into_descriptor())
    }
}

impl RoutineSource for ManifestDirSource {
    fn label(&self) -> String {
        self.dir.display().to_string()
    }

    fn scan(&self) -> Vec<Result<AnimationDescriptor>> {
        if !self.dir.is_dir() {
            debug!("Manifest directory {:?} not found", self.dir);
            return Vec::new();
        }
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => return vec![Err(e.into())],
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths.iter().map(|path| Self::load_file(path)).collect()
    }
}
