use buzzlight_core::testing::{FailingOutput, RecordingOutput};
use buzzlight_core::{
    default_zones, effective_interval, AnimationRegistry, ColorSink, Scheduler, SettingsHandle,
    TaskKind,
};
use std::time::{Duration, Instant};

fn setup() -> (AnimationRegistry, Scheduler, ColorSink, RecordingOutput, SettingsHandle) {
    let settings = SettingsHandle::default();
    let mut sink = ColorSink::new(default_zones(), 11, settings.clone());
    let output = RecordingOutput::new();
    sink.attach(Box::new(output.clone()));
    (
        AnimationRegistry::with_builtins(),
        Scheduler::new(settings.clone()),
        sink,
        output,
        settings,
    )
}

fn start(scheduler: &mut Scheduler, registry: &AnimationRegistry, id: &str, now: Instant) {
    let descriptor = registry.get(id).unwrap();
    scheduler.start(
        TaskKind::Background,
        descriptor.id.clone(),
        descriptor.base_interval_ms,
        descriptor.instantiate(),
        now,
    );
}

#[test]
fn test_switching_background_leaves_one_task() {
    let (registry, mut scheduler, mut sink, output, _) = setup();
    let t0 = Instant::now();

    start(&mut scheduler, &registry, "police", t0);
    start(&mut scheduler, &registry, "strobe", t0);

    assert_eq!(scheduler.live_tasks(), 1);
    let task = scheduler.task(TaskKind::Background).unwrap();
    assert_eq!(task.label, "strobe");

    // strobe tick 0 is full white on every zone; police would leave zone 1 off
    scheduler.poll(t0 + Duration::from_millis(50), &mut sink);
    assert_eq!(sink.readback(1), Some([127, 127, 127]));
    assert_eq!(output.messages().len(), 9);
}

#[test]
fn test_brightness_applies_to_running_animation() {
    let (registry, mut scheduler, mut sink, _, settings) = setup();
    let t0 = Instant::now();
    start(&mut scheduler, &registry, "strobe", t0);

    scheduler.poll(t0 + Duration::from_millis(50), &mut sink);
    assert_eq!(sink.readback(0), Some([127, 127, 127]));

    settings.update(|s| s.brightness_percent = 50);
    scheduler.poll(t0 + Duration::from_millis(100), &mut sink);
    scheduler.poll(t0 + Duration::from_millis(150), &mut sink);
    assert_eq!(sink.readback(0), Some([64, 64, 64]));
}

#[test]
fn test_speed_scales_builtin_intervals() {
    let (registry, mut scheduler, _, _, settings) = setup();
    let t0 = Instant::now();

    settings.update(|s| s.speed_percent = 200);
    start(&mut scheduler, &registry, "rainbow", t0);
    assert_eq!(
        scheduler.task(TaskKind::Background).unwrap().interval,
        Duration::from_millis(25)
    );

    settings.update(|s| s.speed_percent = 10);
    start(&mut scheduler, &registry, "rainbow", t0);
    assert_eq!(
        scheduler.task(TaskKind::Background).unwrap().interval,
        effective_interval(50, 10)
    );
}

#[test]
fn test_unknown_animation_is_an_error() {
    let (registry, scheduler, _, _, _) = setup();
    assert!(registry.get("does-not-exist").is_err());
    assert_eq!(scheduler.live_tasks(), 0);
}

#[test]
fn test_failing_transport_keeps_ticking() {
    let (registry, mut scheduler, _, _, settings) = setup();
    let mut sink = ColorSink::new(default_zones(), 11, settings);
    sink.attach(Box::new(FailingOutput));
    let t0 = Instant::now();
    start(&mut scheduler, &registry, "strobe", t0);

    let events = scheduler.poll(t0 + Duration::from_millis(50), &mut sink);
    assert!(events.is_empty());
    assert_eq!(sink.readback(2), Some([127, 127, 127]));

    scheduler.poll(t0 + Duration::from_millis(100), &mut sink);
    let task = scheduler.task(TaskKind::Background).unwrap();
    assert_eq!(task.ticks, 2);
}

#[test]
fn test_detached_sink_keeps_ticking() {
    let (registry, mut scheduler, _, _, settings) = setup();
    let mut sink = ColorSink::new(default_zones(), 11, settings);
    let t0 = Instant::now();
    start(&mut scheduler, &registry, "police", t0);

    for i in 1..=3 {
        assert!(scheduler
            .poll(t0 + Duration::from_millis(50 * i), &mut sink)
            .is_empty());
    }
    assert_eq!(scheduler.task(TaskKind::Background).unwrap().ticks, 3);
    assert_eq!(sink.readback(0), None);
}
