//! Buzzlight
//!
//! Drives the TimeBuzzer RGB zones: background animations, gesture
//! feedback and media keys.

use anyhow::{anyhow, bail, Context, Result};
use buzzlight_control::{
    list_ports, LightingEngine, LoggingMediaKeys, MidirPort, StatusEvent,
};
use buzzlight_core::{
    default_zones, AnimationRegistry, Color, ColorSink, CoreError, ManifestDirSource, Settings,
    SettingsHandle, SettingsPatch, SettingsStore,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

mod logging_setup;

#[derive(Parser)]
#[command(name = "buzzlight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "RGB feedback and animations for the TimeBuzzer", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Device name filter, overriding the config
    #[arg(short, long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available animations
    List {
        /// Directory with JSON routine manifests
        #[arg(short, long)]
        manifests: Option<PathBuf>,
    },

    /// List MIDI ports
    Ports,

    /// Change saved settings
    Set {
        /// Brightness, 0-100
        #[arg(short, long)]
        brightness: Option<u32>,

        /// Speed, 10-200
        #[arg(short, long)]
        speed: Option<u32>,

        /// Gesture feedback on or off
        #[arg(long)]
        reactive: Option<bool>,

        /// Media keys on or off
        #[arg(long)]
        media: Option<bool>,
    },

    /// Connect to the device and run until interrupted
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Background animation to start
    #[arg(short, long, conflicts_with_all = ["color", "reactive"])]
    animation: Option<String>,

    /// Fixed color as r,g,b (0-127 each)
    #[arg(long, value_parser = parse_color, conflicts_with = "reactive")]
    color: Option<Color>,

    /// Turn gesture feedback on
    #[arg(short, long)]
    reactive: bool,

    /// Skip the welcome sweep
    #[arg(long)]
    no_startup: bool,

    /// Directory with JSON routine manifests
    #[arg(short, long)]
    manifests: Option<PathBuf>,
}

fn parse_color(value: &str) -> std::result::Result<Color, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    match parts.as_slice() {
        [r, g, b] => Ok(Color::new(*r, *g, *b)),
        _ => Err(format!("expected r,g,b but got '{}'", value)),
    }
}

fn build_registry(manifests: Option<PathBuf>) -> AnimationRegistry {
    let mut registry = AnimationRegistry::with_builtins();
    if let Some(dir) = manifests {
        registry.add_source(Box::new(ManifestDirSource::new(dir)));
        let report = registry.refresh();
        for skipped in &report.skipped {
            warn!("Skipped {}: {}", skipped.source, skipped.reason);
        }
    }
    registry
}

/// Load the config before any subscriber exists; the failure is returned for logging later
fn read_settings(store: &SettingsStore) -> (Settings, Option<CoreError>) {
    match store.try_load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

/// Settings for this process only; the device filter override is never saved
fn with_device_override(stored: &Settings, device: Option<&str>) -> Settings {
    let mut settings = stored.clone();
    if let Some(filter) = device {
        settings.device.name_filter = filter.to_string();
    }
    settings
}

/// Merge `patch` into the stored record and write it back
fn save_patch(store: &SettingsStore, mut stored: Settings, patch: &SettingsPatch) -> Result<Settings> {
    patch.apply(&mut stored);
    store.save(&stored).context("Failed to save config")?;
    Ok(stored)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::at_default_location(),
    };
    let (stored, load_error) = read_settings(&store);

    let _log_guard = logging_setup::init(&stored.log, cli.verbose)?;
    if let Some(path) = store.path() {
        debug!("Config: {:?}", path);
    }
    match load_error {
        Some(e) => warn!("Failed to load config, using defaults: {}", e),
        None => info!("Config loaded: {:?}", stored.scaling()),
    }

    match cli.command {
        Commands::List { manifests } => {
            for (id, name) in build_registry(manifests).list() {
                println!("{:<12} {}", id, name);
            }
            Ok(())
        }
        Commands::Ports => {
            let (inputs, outputs) =
                list_ports().map_err(|e| anyhow!("Failed to query MIDI ports: {}", e))?;
            println!("Inputs:");
            for name in inputs {
                println!("  {}", name);
            }
            println!("Outputs:");
            for name in outputs {
                println!("  {}", name);
            }
            Ok(())
        }
        Commands::Set {
            brightness,
            speed,
            reactive,
            media,
        } => {
            let patch = SettingsPatch {
                reactive_mode_enabled: reactive,
                media_enabled: media,
                brightness_percent: brightness,
                speed_percent: speed,
            };
            if patch == SettingsPatch::default() {
                bail!("Nothing to change");
            }
            let settings = save_patch(&store, stored, &patch)?;
            println!(
                "brightness {}%, speed {}%, reactive {}, media {}",
                settings.brightness_percent,
                settings.speed_percent,
                settings.reactive_mode_enabled,
                settings.media_enabled
            );
            Ok(())
        }
        Commands::Run(args) => {
            let settings = with_device_override(&stored, cli.device.as_deref());
            run(settings, store, args).await
        }
    }
}

async fn log_status(mut events: broadcast::Receiver<StatusEvent>) {
    loop {
        match events.recv().await {
            Ok(StatusEvent::ControlActivity { .. }) => {}
            Ok(event) => debug!("Status: {:?}", event),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                debug!("Status log skipped {} events", missed)
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn run(settings: Settings, store: SettingsStore, args: RunArgs) -> Result<()> {
    let device = settings.device.clone();
    let settings = SettingsHandle::new(settings);
    let mut sink = ColorSink::new(default_zones(), device.output_channel, settings.clone());
    let registry = build_registry(args.manifests);

    let (messages, receiver) = mpsc::unbounded_channel();
    let port = match MidirPort::open(&device.name_filter, messages) {
        Ok((port, output)) => {
            sink.attach(Box::new(output));
            Some(port)
        }
        Err(e) => {
            warn!("Running without device: {}", e);
            None
        }
    };

    let mut engine = LightingEngine::new(
        settings,
        store,
        registry,
        sink,
        Box::new(LoggingMediaKeys),
    );
    tokio::spawn(log_status(engine.subscribe()));

    engine.notify(StatusEvent::Connecting);
    if let Some(port) = &port {
        let status = port.status();
        engine.notify(StatusEvent::Connected {
            input: status.input.clone(),
            output: status.output.clone(),
        });
    }

    let now = Instant::now();
    if let Some(id) = &args.animation {
        if let Err(e) = engine.start_animation(id, now) {
            bail!("Cannot start '{}': {}", id, e);
        }
    } else if let Some(color) = args.color {
        engine.manual_color(color);
    } else {
        if !args.no_startup {
            engine.run_startup(now);
        }
        if args.reactive {
            engine.enable_reactive_mode();
        }
    }

    let (handle, task) = engine.spawn(receiver);
    info!("Running, press Ctrl+C to quit");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    if handle.shutdown().await.is_err() {
        warn!("Lighting engine already stopped");
    }
    task.await.context("Lighting engine panicked")?;

    drop(port);
    info!("Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzlight_core::DeviceConfig;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("10, 20,30"), Ok(Color::new(10, 20, 30)));
        assert!(parse_color("10,20").is_err());
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn test_unreadable_config_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (settings, error) = read_settings(&SettingsStore::new(&path));
        assert_eq!(settings, Settings::default());
        assert!(matches!(error, Some(CoreError::ConfigParse(_))));

        let (_, error) = read_settings(&SettingsStore::new(dir.path().join("missing.json")));
        assert!(error.is_none());
    }

    #[test]
    fn test_device_override_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config.json"));
        let (stored, _) = read_settings(&store);

        let runtime = with_device_override(&stored, Some("Launchpad"));
        assert_eq!(runtime.device.name_filter, "Launchpad");

        save_patch(&store, stored, &SettingsPatch::brightness(40)).unwrap();
        let (saved, _) = read_settings(&store);
        assert_eq!(saved.brightness_percent, 40);
        assert_eq!(saved.device.name_filter, DeviceConfig::default().name_filter);
    }

    #[test]
    fn test_cli_rejects_conflicting_modes() {
        assert!(Cli::try_parse_from(["buzzlight", "run", "-a", "fire", "--reactive"]).is_err());
        assert!(Cli::try_parse_from(["buzzlight", "run", "--color", "1,2,3"]).is_ok());
    }
}
