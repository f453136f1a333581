//! Animation catalog
//!
//! The registry maps ids to [`AnimationDescriptor`]s. Contents come from
//! [`RoutineSource`]s and are rebuilt by [`AnimationRegistry::refresh`]. Reserved
//! entries (the startup sweep) survive a refresh and are never offered
//! through [`AnimationRegistry::list`].

use crate::animation::Animation;
use crate::error::{CoreError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Factory = Arc<dyn Fn() -> Box<dyn Animation> + Send + Sync>;

/// One catalog entry
#[derive(Clone)]
pub struct AnimationDescriptor {
    /// Unique id used to start the animation
    pub id: String,
    /// Name shown to users
    pub display_name: String,
    /// Tick interval at 100% speed, always at least 1
    pub base_interval_ms: u64,
    factory: Factory,
}

impl AnimationDescriptor {
    /// Describe an animation built by `factory`
    pub fn new<F>(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_interval_ms: u64,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Box<dyn Animation> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            base_interval_ms: base_interval_ms.max(1),
            factory: Arc::new(factory),
        }
    }

    /// Build a fresh routine instance with its own state
    pub fn instantiate(&self) -> Box<dyn Animation> {
        (self.factory)()
    }
}

impl fmt::Debug for AnimationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("base_interval_ms", &self.base_interval_ms)
            .finish_non_exhaustive()
    }
}

/// Something the registry can (re)load descriptors from
pub trait RoutineSource: Send {
    /// Name used in logs and skip reports
    fn label(&self) -> String;

    /// Produce every entry; malformed entries come back as errors
    fn scan(&self) -> Vec<Result<AnimationDescriptor>>;
}

/// An entry that was left out of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRoutine {
    /// Source the entry came from
    pub source: String,
    /// Why it was skipped
    pub reason: String,
}

/// Outcome of [`AnimationRegistry::refresh`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Entries now registered from sources
    pub loaded: usize,
    /// Entries that were skipped
    pub skipped: Vec<SkippedRoutine>,
}

/// Id to descriptor mapping plus the sources it is rebuilt from
#[derive(Default)]
pub struct AnimationRegistry {
    entries: BTreeMap<String, AnimationDescriptor>,
    reserved: BTreeSet<String>,
    sources: Vec<Box<dyn RoutineSource>>,
}

impl AnimationRegistry {
    /// Empty registry without sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry loaded from the built-in catalog, with the welcome sweep reserved
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.reserve(crate::startup::WelcomeSweep::descriptor());
        registry.add_source(Box::new(crate::routines::BuiltinSource));
        registry.refresh();
        registry
    }

    /// Add a source used by the next [`refresh`](Self::refresh)
    pub fn add_source(&mut self, source: Box<dyn RoutineSource>) {
        self.sources.push(source);
    }

    /// Insert or replace by id
    pub fn register(&mut self, descriptor: AnimationDescriptor) {
        debug!("Registered animation {}", descriptor.id);
        self.entries.insert(descriptor.id.clone(), descriptor);
    }

    /// Register an entry that refresh keeps and `list` hides
    pub fn reserve(&mut self, descriptor: AnimationDescriptor) {
        self.reserved.insert(descriptor.id.clone());
        self.register(descriptor);
    }

    /// `(id, display name)` pairs of user-selectable animations, ordered by id
    pub fn list(&self) -> Vec<(String, String)> {
        self.entries
            .values()
            .filter(|d| !self.reserved.contains(&d.id))
            .map(|d| (d.id.clone(), d.display_name.clone()))
            .collect()
    }

    /// Look up a descriptor
    pub fn get(&self, id: &str) -> Result<&AnimationDescriptor> {
        self.entries
            .get(id)
            .ok_or_else(|| CoreError::UnknownAnimation(id.to_string()))
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries, reserved included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild from every source
    ///
    /// Reserved entries are kept; everything else is replaced. A bad entry
    /// is skipped and reported without affecting the others.
    pub fn refresh(&mut self) -> RefreshReport {
        let reserved = &self.reserved;
        self.entries.retain(|id, _| reserved.contains(id));

        let mut report = RefreshReport::default();
        for source in &self.sources {
            let label = source.label();
            for entry in source.scan() {
                match entry {
                    Ok(descriptor) if self.reserved.contains(&descriptor.id) => {
                        warn!("{}: id '{}' is reserved, skipping", label, descriptor.id);
                        report.skipped.push(SkippedRoutine {
                            source: label.clone(),
                            reason: format!("id '{}' is reserved", descriptor.id),
                        });
                    }
                    Ok(descriptor) => {
                        self.entries.insert(descriptor.id.clone(), descriptor);
                        report.loaded += 1;
                    }
                    Err(e) => {
                        warn!("Skipping routine from {}: {}", label, e);
                        report.skipped.push(SkippedRoutine {
                            source: label.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            "Loaded {} animations ({} skipped)",
            report.loaded,
            report.skipped.len()
        );
        report
    }
}

impl fmt::Debug for AnimationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("reserved", &self.reserved)
            .field("sources", &self.sources.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{FnRoutine, Frame};
    use crate::color::Color;

    fn solid(frame: &mut Frame<'_>, _tick: u64) {
        frame.fill(Color::WHITE);
    }

    fn descriptor(id: &str, name: &str) -> AnimationDescriptor {
        AnimationDescriptor::new(id, name, 50, || -> Box<dyn Animation> { Box::new(FnRoutine(solid)) })
    }

    struct StaticSource(Vec<std::result::Result<(&'static str, &'static str), &'static str>>);

    impl RoutineSource for StaticSource {
        fn label(&self) -> String {
            "static".to_string()
        }

        fn scan(&self) -> Vec<Result<AnimationDescriptor>> {
            self.0
                .iter()
                .map(|entry| match entry {
                    Ok((id, name)) => Ok(descriptor(id, name)),
                    Err(reason) => Err(CoreError::MalformedRoutine {
                        source_name: "bad.json".to_string(),
                        reason: reason.to_string(),
                    }),
                })
                .collect()
        }
    }

    #[test]
    fn test_register_replaces_by_id() {
        let mut registry = AnimationRegistry::new();
        registry.register(descriptor("fire", "Fire"));
        registry.register(descriptor("fire", "Campfire"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("fire").unwrap().display_name, "Campfire");
    }

    #[test]
    fn test_get_unknown() {
        let registry = AnimationRegistry::new();
        assert!(matches!(
            registry.get("nope"),
            Err(CoreError::UnknownAnimation(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_list_is_ordered_and_hides_reserved() {
        let mut registry = AnimationRegistry::new();
        registry.register(descriptor("wave", "Wave"));
        registry.register(descriptor("aurora", "Aurora"));
        registry.reserve(descriptor("welcome", "Welcome"));

        assert_eq!(
            registry.list(),
            vec![
                ("aurora".to_string(), "Aurora".to_string()),
                ("wave".to_string(), "Wave".to_string()),
            ]
        );
        assert!(registry.get("welcome").is_ok());
    }

    #[test]
    fn test_refresh_skips_malformed_and_keeps_reserved() {
        let mut registry = AnimationRegistry::new();
        registry.reserve(descriptor("welcome", "Welcome"));
        registry.register(descriptor("stale", "Stale"));
        registry.add_source(Box::new(StaticSource(vec![
            Ok(("fire", "Fire")),
            Err("missing routine"),
            Ok(("welcome", "Impostor")),
            Ok(("ice", "Ice")),
        ])));

        let report = registry.refresh();

        assert_eq!(report.loaded, 2);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().all(|s| s.source == "static"));
        assert!(!registry.contains("stale"));
        assert!(registry.contains("fire"));
        assert!(registry.contains("ice"));
        assert_eq!(registry.get("welcome").unwrap().display_name, "Welcome");
    }

    #[test]
    fn test_with_builtins() {
        let registry = AnimationRegistry::with_builtins();
        assert_eq!(registry.list().len(), 20);
        assert_eq!(registry.list()[0].0, "aurora");
        assert_eq!(registry.get(crate::startup::STARTUP_ID).unwrap().base_interval_ms, 25);
    }

    #[test]
    fn test_base_interval_is_positive() {
        let d = AnimationDescriptor::new("x", "X", 0, || -> Box<dyn Animation> { Box::new(FnRoutine(solid)) });
        assert_eq!(d.base_interval_ms, 1);
    }
}
