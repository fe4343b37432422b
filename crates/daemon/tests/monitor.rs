//! Integration tests for the monitor actor.
//!
//! A scripted sampler, a recording notifier, and a manual clock stand in for
//! the real sensor, the D-Bus daemon, and the wall clock.

use battmon_config::MonitorConfig;
use battmon_core::{
    AlertEngine, AlertEvent, AlertKind, BatterySampler, CooldownPolicy, MonitorError, Notifier,
    Reading, Sample, Thresholds, TimeRemaining, Tone,
};
use battmon_daemon::{Monitor, MonitorHandle};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ScriptedSampler(Arc<Mutex<Sample>>);

impl ScriptedSampler {
    fn set(&self, sample: Sample) {
        *self.0.lock().unwrap() = sample;
    }
}

impl BatterySampler for ScriptedSampler {
    fn sample(&mut self) -> Sample {
        *self.0.lock().unwrap()
    }
}

/// Takes its time, like a sysfs read on a drowsy embedded controller.
#[derive(Debug)]
struct SlowSampler {
    delay: Duration,
    sample: Sample,
}

impl BatterySampler for SlowSampler {
    fn sample(&mut self) -> Sample {
        std::thread::sleep(self.delay);
        self.sample
    }
}

#[derive(Debug, Clone, Default)]
struct Recorder(Arc<Mutex<Vec<AlertEvent>>>);

impl Recorder {
    fn events(&self) -> Vec<AlertEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn send(&self, event: AlertEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Debug, Clone, Default)]
struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    fn set(&self, secs: i64) {
        self.0.store(secs, Ordering::SeqCst);
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + self.0.load(Ordering::SeqCst), 0).unwrap()
    }
}

fn reading(percent: u8, plugged_in: bool) -> Sample {
    Sample::Available(Reading::new(percent, plugged_in, TimeRemaining::Unknown))
}

struct Harness {
    handle: MonitorHandle,
    task: JoinHandle<()>,
    sampler: ScriptedSampler,
    recorder: Recorder,
    clock: ManualClock,
}

/// A paused monitor: nothing is sampled until the test asks.
fn harness(initial: Sample, cooldown_secs: u64) -> Harness {
    let sampler = ScriptedSampler(Arc::new(Mutex::new(initial)));
    let recorder = Recorder::default();
    let clock = ManualClock::default();

    let engine = AlertEngine::new(
        Thresholds::new(20, 90).unwrap(),
        CooldownPolicy::from_secs(cooldown_secs),
    );
    let tick_clock = clock.clone();
    let (handle, task) = Monitor::new(engine, sampler.clone(), recorder.clone())
        .with_clock(move || tick_clock.now())
        .with_interval(Duration::from_secs(3600))
        .paused()
        .spawn();

    Harness {
        handle,
        task,
        sampler,
        recorder,
        clock,
    }
}

async fn wait_for_events(recorder: &Recorder, count: usize) {
    for _ in 0..200 {
        if recorder.events().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} events, saw {}", recorder.events().len());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn low_battery_fires_then_waits_out_cooldown() {
    let h = harness(reading(15, false), 30);

    h.clock.set(0);
    let first = h.handle.check_now().await.unwrap();
    assert_eq!(first.alert.as_ref().map(|e| e.kind), Some(AlertKind::LowBattery));

    h.clock.set(10);
    let second = h.handle.check_now().await.unwrap();
    assert!(second.alert.is_none());
    assert_eq!(second.suppressed, Some(AlertKind::LowBattery));

    h.clock.set(31);
    let third = h.handle.check_now().await.unwrap();
    assert_eq!(third.alert.map(|e| e.kind), Some(AlertKind::LowBattery));

    let sent = h.recorder.events();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|e| e.kind == AlertKind::LowBattery));
}

#[tokio::test]
async fn rejected_thresholds_leave_engine_untouched() {
    let h = harness(reading(30, false), 0);

    let err = h.handle.set_thresholds(50, 40).await.unwrap_err();
    assert!(matches!(err, MonitorError::InvalidThresholds { low: 50, full: 40 }));

    let settings = h.handle.settings().await.unwrap();
    assert_eq!(settings.thresholds, Thresholds::new(20, 90).unwrap());

    let report = h.handle.check_now().await.unwrap();
    assert!(report.alert.is_none(), "30% is above the kept low threshold");
    assert!(h.recorder.events().is_empty());

    h.handle.set_thresholds(35, 90).await.unwrap();
    h.clock.set(1);
    let report = h.handle.check_now().await.unwrap();
    assert_eq!(report.alert.map(|e| e.kind), Some(AlertKind::LowBattery));
}

#[tokio::test]
async fn full_battery_fires_once_per_cooldown() {
    let h = harness(reading(95, true), 60);

    for t in [0, 15, 45, 60] {
        h.clock.set(t);
        h.handle.check_now().await.unwrap();
    }
    assert_eq!(h.recorder.events().len(), 1);
    assert_eq!(h.recorder.events()[0].kind, AlertKind::FullBattery);

    h.clock.set(61);
    h.handle.check_now().await.unwrap();
    assert_eq!(h.recorder.events().len(), 2);
}

#[tokio::test]
async fn unavailable_sensor_reports_degraded_status() {
    let h = harness(Sample::Unavailable, 0);

    let report = h.handle.check_now().await.unwrap();
    assert!(report.alert.is_none());
    assert!(report.suppressed.is_none());
    assert_eq!(report.status.tone, Tone::Unavailable);
    assert_eq!(report.health.to_string(), "Health: N/A   |   Time left: N/A");
    assert!(h.recorder.events().is_empty());

    // Recovery: the engine was never touched, so the first low reading fires.
    h.sampler.set(reading(5, false));
    let report = h.handle.check_now().await.unwrap();
    assert!(report.alert.is_some());
}

#[tokio::test]
async fn resume_samples_immediately_and_pause_stops_polling() {
    let h = harness(reading(10, false), 0);
    let ticking = h.clock.clone();

    h.handle.resume().await.unwrap();
    wait_for_events(&h.recorder, 1).await;
    assert!(h.handle.settings().await.unwrap().monitoring);

    h.handle.pause().await.unwrap();
    let settings = h.handle.settings().await.unwrap();
    assert!(!settings.monitoring);

    let before = h.recorder.events().len();
    ticking.set(10_000);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.recorder.events().len(), before);
}

#[tokio::test]
async fn polling_fires_on_the_interval() {
    let sampler = ScriptedSampler(Arc::new(Mutex::new(reading(3, false))));
    let recorder = Recorder::default();
    let engine = AlertEngine::new(Thresholds::default(), CooldownPolicy::from_secs(0));
    let (handle, task) = Monitor::new(engine, sampler, recorder.clone())
        .with_interval(Duration::from_millis(10))
        .spawn();

    wait_for_events(&recorder, 3).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn reloaded_config_applies_valid_parts() {
    let h = harness(reading(50, false), 30);

    let mut cfg = MonitorConfig::default();
    cfg.thresholds.low = 60;
    cfg.thresholds.full = 50;
    cfg.cooldown.minutes = 1;
    cfg.cooldown.seconds = 5;
    cfg.poll.interval_secs = 20;

    h.handle.apply_config(&cfg).await.unwrap();

    let settings = h.handle.settings().await.unwrap();
    assert_eq!(settings.thresholds, Thresholds::new(20, 90).unwrap());
    assert_eq!(settings.cooldown.duration_secs, 65);
    assert_eq!(settings.interval_secs, 20);
}

#[tokio::test]
async fn report_serializes_for_status_output() {
    let h = harness(reading(95, true), 0);
    let report = h.handle.check_now().await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"]["tone"], "attention");
    assert_eq!(json["status"]["text"], "Status: 95% (Charging)");
    assert_eq!(json["health"]["health"], "Good");
    assert_eq!(json["alert"]["kind"], "full_battery");
    assert!(json["suppressed"].is_null());
}

#[tokio::test]
async fn slow_sensor_read_does_not_hold_up_reconfiguration() {
    let recorder = Recorder::default();
    let engine = AlertEngine::new(Thresholds::default(), CooldownPolicy::from_secs(0));
    let sampler = SlowSampler {
        delay: Duration::from_millis(600),
        sample: reading(15, false),
    };
    let (handle, task) = Monitor::new(engine, sampler, recorder.clone())
        .paused()
        .spawn();

    let in_flight = tokio::spawn({
        let handle = handle.clone();
        async move { handle.check_now().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    tokio::time::timeout(Duration::from_millis(300), handle.set_thresholds(10, 80))
        .await
        .expect("threshold update waited for the sensor read")
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(300));

    // The read lands after the update, so 15% is judged against low = 10.
    let report = in_flight.await.unwrap().unwrap();
    assert!(report.alert.is_none());
    assert!(recorder.events().is_empty());

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn handle_reports_stopped_monitor() {
    let h = harness(reading(50, false), 0);
    h.handle.shutdown().await.unwrap();
    h.task.await.unwrap();

    assert!(matches!(h.handle.check_now().await, Err(MonitorError::MonitorStopped)));
    assert!(matches!(h.handle.pause().await, Err(MonitorError::MonitorStopped)));
}
