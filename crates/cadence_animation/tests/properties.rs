//! End-to-end behavior of the animation state machine and composites

use cadence_animation::{
    AnimationBuilder, AnimationEvent, AnimationListener, EventKind, Lifecycle, PropertyPlugin,
    PluginContext, Repeat, TimingState,
};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

type EventLog = Arc<Mutex<Vec<(EventKind, f32)>>>;

fn event_log() -> (EventLog, impl AnimationListener + 'static) {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let listener = move |event: &AnimationEvent<'_>| {
        sink.lock().unwrap().push((event.kind, event.position));
    };
    (log, listener)
}

fn kinds(log: &EventLog) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
}

fn count(log: &EventLog, kind: EventKind) -> usize {
    kinds(log).into_iter().filter(|k| *k == kind).count()
}

/// Records every position handed to `update`
struct PositionProbe(Arc<Mutex<Vec<f32>>>);

impl PropertyPlugin for PositionProbe {
    fn update(&mut self, ctx: &PluginContext<'_>) {
        self.0.lock().unwrap().push(ctx.position);
    }
}

#[test]
fn test_progress_is_monotonic_within_cycle() {
    init_tracing();
    let positions = Arc::new(Mutex::new(Vec::new()));
    let mut anim = AnimationBuilder::new()
        .duration(1000.0)
        .plugin(PositionProbe(positions.clone()))
        .build()
        .unwrap();
    anim.start();

    let steps = [3.0, 17.0, 16.6, 40.0, 1.0, 250.0, 33.3, 100.0];
    for dt in steps.iter().cycle().take(40) {
        if anim.step(*dt) {
            break;
        }
    }

    let positions = positions.lock().unwrap();
    assert!(positions.len() > 10);
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*positions.last().unwrap(), 1.0);
}

#[test]
fn test_three_cycles_three_steps() {
    init_tracing();
    let (log, listener) = event_log();
    let mut anim = AnimationBuilder::new()
        .duration(1000.0)
        .repeat(Repeat::Times(3))
        .listener(listener)
        .build()
        .unwrap();
    anim.start();

    assert!(!anim.step(1000.0));
    assert!(!anim.step(1000.0));
    assert!(anim.step(1000.0));

    assert_eq!(count(&log, EventKind::End), 3);
    assert_eq!(count(&log, EventKind::Complete), 1);
    assert_eq!(anim.lifecycle(), Lifecycle::Stopped);
    assert_eq!(anim.completed_repeats(), 3);
}

#[test]
fn test_fps_throttle_reports_whole_steps() {
    init_tracing();
    let (log, listener) = event_log();
    let mut anim = AnimationBuilder::new()
        .duration(5000.0)
        .fps(10)
        .listener(listener)
        .build()
        .unwrap();
    anim.start();

    let mut first_update = None;
    for call in 1..=40 {
        anim.step(30.0);
        if first_update.is_none() && count(&log, EventKind::Step) > 0 {
            first_update = Some(call);
        }
    }

    assert_eq!(first_update, Some(4));
    assert_eq!(count(&log, EventKind::Step), 12);
    assert_eq!(anim.timing_state().elapsed_time, 1200.0);
}

#[test]
fn test_sequence_total_matches_elements() {
    init_tracing();
    let tween = |duration: f32| AnimationBuilder::new().duration(duration).build().unwrap();

    let mut anim = AnimationBuilder::new().build_sequence().unwrap();
    let mut seq = anim.as_sequence_mut().unwrap();
    let check = |seq: &cadence_animation::Sequence| {
        let sum: f32 = (0..seq.len())
            .map(|i| seq.get_index(i).unwrap().1.span_ms())
            .sum();
        assert!((sum - seq.total_ms()).abs() < 1e-3);
    };

    seq.push(Some("a".into()), tween(100.0)).unwrap();
    check(&seq);
    seq.push(None, tween(250.0)).unwrap();
    check(&seq);
    seq.insert(0, Some("first".into()), tween(40.0)).unwrap();
    check(&seq);
    let scaled = AnimationBuilder::new()
        .duration(100.0)
        .time_scale(4.0)
        .repeat(Repeat::Times(2))
        .build()
        .unwrap();
    seq.insert(2, None, scaled).unwrap();
    check(&seq);
    seq.remove_named("a").unwrap();
    check(&seq);
    seq.remove(0).unwrap();
    check(&seq);

    assert!((seq.total_ms() - 300.0).abs() < 1e-3);
}

#[test]
fn test_timeline_set_time_is_repeatable() {
    init_tracing();
    let mut anim = AnimationBuilder::new().build_timeline().unwrap();
    {
        let mut timeline = anim.as_timeline_mut().unwrap();
        for (i, offset) in [0.0, 120.0, 480.0].into_iter().enumerate() {
            let child = AnimationBuilder::new()
                .duration(300.0)
                .repeat(Repeat::Times(2))
                .repeat_delay(25.0)
                .build()
                .unwrap();
            timeline.add(format!("track-{}", i), offset, child).unwrap();
        }
    }

    let snapshot = |anim: &cadence_animation::Animation| -> Vec<(Lifecycle, TimingState)> {
        let timeline = anim.as_timeline().unwrap();
        timeline
            .names()
            .map(|name| {
                let child = timeline.get(name).unwrap();
                (child.lifecycle(), *child.timing_state())
            })
            .collect()
    };

    for time in [0.0, 333.0, 700.0, 1130.0] {
        anim.as_timeline_mut().unwrap().set_time(time);
        let first = snapshot(&anim);
        anim.as_timeline_mut().unwrap().set_time(time);
        assert_eq!(first, snapshot(&anim), "time {}", time);
    }
}

#[test]
fn test_infinite_repeat_never_completes() {
    init_tracing();
    let (log, listener) = event_log();
    let mut anim = AnimationBuilder::new()
        .duration(50.0)
        .repeat(Repeat::Infinite)
        .listener(listener)
        .build()
        .unwrap();
    anim.start();

    for _ in 0..1000 {
        assert!(!anim.step(37.0));
    }
    assert_eq!(anim.lifecycle(), Lifecycle::Running);
    assert_eq!(count(&log, EventKind::Complete), 0);
    assert!(anim.completed_repeats() > 700);
}

#[test]
fn test_delay_then_half_then_complete() {
    init_tracing();
    let (log, listener) = event_log();
    let mut anim = AnimationBuilder::new()
        .duration(500.0)
        .delay(100.0)
        .listener(listener)
        .build()
        .unwrap();
    anim.start();

    assert!(!anim.step(100.0));
    let events = kinds(&log);
    assert_eq!(&events[..2], &[EventKind::Begin, EventKind::Start]);
    assert_eq!(anim.position(), 0.0);

    assert!(!anim.step(250.0));
    assert!((anim.position() - 0.5).abs() < 1e-6);

    log.lock().unwrap().clear();
    assert!(anim.step(250.0));
    let events = kinds(&log);
    assert!(events.contains(&EventKind::End));
    assert_eq!(events.last(), Some(&EventKind::Complete));
    assert_eq!(anim.lifecycle(), Lifecycle::Stopped);

    for _ in 0..3 {
        assert!(anim.step(100.0));
    }
}

#[test]
fn test_event_mask_filters_listener() {
    init_tracing();
    let (log, listener) = event_log();
    let mut anim = AnimationBuilder::new()
        .duration(100.0)
        .event_mask(EventKind::Begin | EventKind::Complete)
        .listener(listener)
        .build()
        .unwrap();
    anim.start();
    while !anim.step(16.0) {}

    assert_eq!(kinds(&log), vec![EventKind::Begin, EventKind::Complete]);
}

#[test]
fn test_nested_sequence_in_parallel() {
    init_tracing();
    let tween = |duration: f32| AnimationBuilder::new().duration(duration).build().unwrap();

    let mut inner = AnimationBuilder::new().build_sequence().unwrap();
    {
        let mut seq = inner.as_sequence_mut().unwrap();
        seq.push(None, tween(100.0)).unwrap();
        seq.push(None, tween(100.0)).unwrap();
    }

    let mut group = AnimationBuilder::new()
        .build_parallel(Default::default())
        .unwrap();
    {
        let mut parallel = group.as_parallel_mut().unwrap();
        parallel.add("chain", inner).unwrap();
        parallel.add("solo", tween(150.0)).unwrap();
    }
    assert_eq!(group.span_ms(), 200.0);

    group.start();
    let mut elapsed: f32 = 0.0;
    while !group.step(10.0) {
        elapsed += 10.0;
        assert!(elapsed < 1000.0);
    }
    assert!((elapsed - 190.0).abs() < 1e-3);
}
