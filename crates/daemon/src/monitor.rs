//! The monitor actor.
//!
//! Two cooperating loops make up a running monitor:
//!
//! - the **engine actor** owns the [`AlertEngine`] and the notifier.  It
//!   handles one command at a time, so evaluation and reconfiguration never
//!   interleave.  It never touches the sensor.
//! - the **poller** owns the sampler and the poll timer.  Sensor reads run on
//!   the blocking pool and the finished [`Sample`] is handed to the engine
//!   actor as an `Evaluate` command.
//!
//! Every caller (signal handlers, the config watcher, tests) reaches both
//! through a [`MonitorHandle`].

use battmon_config::MonitorConfig;
use battmon_core::{
    AlertEngine, AlertEvent, AlertKind, BatterySampler, CooldownPolicy, Decision, HealthReadout,
    MonitorError, Notifier, Result, Sample, StatusLine, Thresholds,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Default time between two sensor reads.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Wall-clock source; swapped out in tests.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

// ── Reports ───────────────────────────────────────────────────────────────────

/// Everything learned from one sensor read.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub at: DateTime<Utc>,
    pub sample: Sample,
    pub status: StatusLine,
    pub health: HealthReadout,
    /// The alert that was dispatched, if any.
    pub alert: Option<AlertEvent>,
    /// Set when a condition held but the cooldown held it back.
    pub suppressed: Option<AlertKind>,
}

/// Current engine and loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorSettings {
    pub thresholds: Thresholds,
    pub cooldown: CooldownPolicy,
    pub interval_secs: u64,
    pub monitoring: bool,
}

// ── Commands ──────────────────────────────────────────────────────────────────

enum EngineCommand {
    Evaluate {
        sample: Sample,
        reply: Option<oneshot::Sender<TickReport>>,
    },
    SetThresholds {
        low: u8,
        full: u8,
        reply: oneshot::Sender<Result<()>>,
    },
    SetCooldown(u64),
    Settings(oneshot::Sender<(Thresholds, CooldownPolicy)>),
    Shutdown,
}

enum PollCommand {
    CheckNow(oneshot::Sender<TickReport>),
    SetInterval(Duration),
    Pause,
    Resume,
    Toggle,
    Settings(oneshot::Sender<(Duration, bool)>),
    Shutdown,
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable front door to a running monitor.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    engine: mpsc::Sender<EngineCommand>,
    poller: mpsc::Sender<PollCommand>,
}

impl MonitorHandle {
    async fn to_engine(&self, cmd: EngineCommand) -> Result<()> {
        self.engine.send(cmd).await.map_err(|_| MonitorError::MonitorStopped)
    }

    async fn to_poller(&self, cmd: PollCommand) -> Result<()> {
        self.poller.send(cmd).await.map_err(|_| MonitorError::MonitorStopped)
    }

    /// Sample and evaluate immediately, regardless of the pause state.
    pub async fn check_now(&self) -> Result<TickReport> {
        let (reply, rx) = oneshot::channel();
        self.to_poller(PollCommand::CheckNow(reply)).await?;
        rx.await.map_err(|_| MonitorError::MonitorStopped)
    }

    /// Replace both thresholds.  Fails without changing anything when the
    /// pair is invalid.
    pub async fn set_thresholds(&self, low: u8, full: u8) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.to_engine(EngineCommand::SetThresholds { low, full, reply })
            .await?;
        rx.await.map_err(|_| MonitorError::MonitorStopped)?
    }

    pub async fn set_cooldown(&self, seconds: u64) -> Result<()> {
        self.to_engine(EngineCommand::SetCooldown(seconds)).await
    }

    /// Change the poll interval.  The next read happens one full interval
    /// after the change.
    pub async fn set_interval(&self, interval: Duration) -> Result<()> {
        self.to_poller(PollCommand::SetInterval(interval)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.to_poller(PollCommand::Pause).await
    }

    /// Resume polling; the first read happens right away.
    pub async fn resume(&self) -> Result<()> {
        self.to_poller(PollCommand::Resume).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.to_poller(PollCommand::Toggle).await
    }

    pub async fn settings(&self) -> Result<MonitorSettings> {
        let (reply, rx) = oneshot::channel();
        self.to_engine(EngineCommand::Settings(reply)).await?;
        let (thresholds, cooldown) = rx.await.map_err(|_| MonitorError::MonitorStopped)?;

        let (reply, rx) = oneshot::channel();
        self.to_poller(PollCommand::Settings(reply)).await?;
        let (interval, monitoring) = rx.await.map_err(|_| MonitorError::MonitorStopped)?;

        Ok(MonitorSettings {
            thresholds,
            cooldown,
            interval_secs: interval.as_secs(),
            monitoring,
        })
    }

    /// Apply a reloaded configuration file.
    ///
    /// Invalid thresholds are logged and skipped; the cooldown and interval
    /// are still applied.
    pub async fn apply_config(&self, config: &MonitorConfig) -> Result<()> {
        match self
            .set_thresholds(config.thresholds.low, config.thresholds.full)
            .await
        {
            Err(e) if e.is_threshold_error() => warn!("Keeping previous thresholds: {e}"),
            other => other?,
        }
        self.set_cooldown(config.cooldown().duration_secs).await?;
        self.set_interval(config.poll_interval()).await
    }

    /// Stop both loops.  A sensor read already in flight finishes first.
    pub async fn shutdown(&self) -> Result<()> {
        // The poller may already be gone if the engine stopped first.
        let _ = self.to_poller(PollCommand::Shutdown).await;
        self.to_engine(EngineCommand::Shutdown).await
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Owns the engine and its collaborators.  Build it, then [`spawn`](Self::spawn).
pub struct Monitor<S, N> {
    engine: AlertEngine,
    sampler: S,
    notifier: N,
    clock: Clock,
    interval: Duration,
    monitoring: bool,
}

impl<S, N> Monitor<S, N>
where
    S: BatterySampler + 'static,
    N: Notifier + 'static,
{
    pub fn new(engine: AlertEngine, sampler: S, notifier: N) -> Self {
        Self {
            engine,
            sampler,
            notifier,
            clock: Box::new(Utc::now),
            interval: DEFAULT_INTERVAL,
            monitoring: true,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Start without polling; only explicit `check_now` calls sample.
    pub fn paused(mut self) -> Self {
        self.monitoring = false;
        self
    }

    /// Run the engine actor and the poller on the current runtime.  The
    /// returned task finishes once both have stopped.
    pub fn spawn(self) -> (MonitorHandle, JoinHandle<()>) {
        let (engine_tx, engine_rx) = mpsc::channel(16);
        let (poll_tx, poll_rx) = mpsc::channel(16);

        info!(
            low = self.engine.thresholds().low(),
            full = self.engine.thresholds().full(),
            cooldown_secs = self.engine.cooldown().duration_secs,
            interval_secs = self.interval.as_secs(),
            monitoring = self.monitoring,
            "monitor started"
        );

        let actor = EngineActor {
            engine: self.engine,
            notifier: self.notifier,
            clock: self.clock,
        };
        let poller = Poller {
            sampler: Arc::new(Mutex::new(self.sampler)),
            engine: engine_tx.clone(),
            interval: self.interval,
            monitoring: self.monitoring,
            sensor_up: None,
        };

        let task = tokio::spawn(async move {
            tokio::join!(actor.run(engine_rx), poller.run(poll_rx));
            info!("monitor stopped");
        });
        let handle = MonitorHandle {
            engine: engine_tx,
            poller: poll_tx,
        };
        (handle, task)
    }
}

// ── Engine actor ──────────────────────────────────────────────────────────────

struct EngineActor<N> {
    engine: AlertEngine,
    notifier: N,
    clock: Clock,
}

impl<N: Notifier> EngineActor<N> {
    async fn run(mut self, mut rx: mpsc::Receiver<EngineCommand>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                EngineCommand::Evaluate { sample, reply } => {
                    let report = self.evaluate(sample);
                    if let Some(reply) = reply {
                        let _ = reply.send(report);
                    }
                }
                EngineCommand::SetThresholds { low, full, reply } => {
                    let result = self.engine.set_thresholds(low, full);
                    match &result {
                        Ok(()) => info!(low, full, "thresholds updated"),
                        Err(e) => warn!("rejected threshold update: {e}"),
                    }
                    let _ = reply.send(result);
                }
                EngineCommand::SetCooldown(secs) => {
                    if secs != self.engine.cooldown().duration_secs {
                        info!(secs, "cooldown updated");
                    }
                    self.engine.set_cooldown(secs);
                }
                EngineCommand::Settings(reply) => {
                    let _ = reply.send((self.engine.thresholds(), self.engine.cooldown()));
                }
                EngineCommand::Shutdown => break,
            }
        }
    }

    /// Decide on an already-read sample, then dispatch.
    fn evaluate(&mut self, sample: Sample) -> TickReport {
        let now = (self.clock)();
        let decision = self.engine.decide(&sample, now);
        let thresholds = self.engine.thresholds();

        let mut report = TickReport {
            at: now,
            status: StatusLine::describe(&sample, &thresholds),
            health: HealthReadout::from_sample(&sample),
            sample,
            alert: None,
            suppressed: None,
        };
        debug!(status = %report.status, health = %report.health, "tick");

        match decision {
            Decision::Fire(event) => {
                info!(kind = %event.kind, "{}", event.body);
                report.alert = Some(event.clone());
                self.notifier.send(event);
            }
            Decision::Suppressed(kind) => report.suppressed = Some(kind),
            Decision::Idle | Decision::SensorUnavailable => {}
        }
        report
    }
}

// ── Poller ────────────────────────────────────────────────────────────────────

struct Poller<S> {
    sampler: Arc<Mutex<S>>,
    engine: mpsc::Sender<EngineCommand>,
    interval: Duration,
    monitoring: bool,
    sensor_up: Option<bool>,
}

impl<S: BatterySampler + 'static> Poller<S> {
    async fn run(mut self, mut rx: mpsc::Receiver<PollCommand>) {
        let mut ticker = self.ticker(true);

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick(), if self.monitoring => {
                    if !self.poll(None).await {
                        break;
                    }
                }
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    match self.handle(cmd).await {
                        Flow::Continue => {}
                        Flow::Restart { immediate } => ticker = self.ticker(immediate),
                        Flow::Stop => break,
                    }
                }
            }
        }
    }

    fn ticker(&self, immediate: bool) -> Interval {
        let start = if immediate {
            time::Instant::now()
        } else {
            time::Instant::now() + self.interval
        };
        let mut ticker = time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn handle(&mut self, cmd: PollCommand) -> Flow {
        match cmd {
            PollCommand::CheckNow(reply) => {
                if !self.poll(Some(reply)).await {
                    return Flow::Stop;
                }
            }
            PollCommand::SetInterval(interval) => {
                let interval = interval.max(Duration::from_millis(1));
                if interval != self.interval {
                    info!(secs = interval.as_secs(), "poll interval updated");
                    self.interval = interval;
                    return Flow::Restart { immediate: false };
                }
            }
            PollCommand::Pause => return self.set_monitoring(false),
            PollCommand::Resume => return self.set_monitoring(true),
            PollCommand::Toggle => return self.set_monitoring(!self.monitoring),
            PollCommand::Settings(reply) => {
                let _ = reply.send((self.interval, self.monitoring));
            }
            PollCommand::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    fn set_monitoring(&mut self, on: bool) -> Flow {
        if on == self.monitoring {
            return Flow::Continue;
        }
        self.monitoring = on;
        info!("{}", if on { "monitoring resumed" } else { "monitoring paused" });
        if on {
            Flow::Restart { immediate: true }
        } else {
            Flow::Continue
        }
    }

    /// Read the sensor and hand the sample to the engine.  Returns `false`
    /// once the engine actor is gone.
    async fn poll(&mut self, reply: Option<oneshot::Sender<TickReport>>) -> bool {
        let sample = self.read_sensor().await;
        self.note_sensor(&sample);
        self.engine
            .send(EngineCommand::Evaluate { sample, reply })
            .await
            .is_ok()
    }

    async fn read_sensor(&self) -> Sample {
        let sampler = Arc::clone(&self.sampler);
        let read = tokio::task::spawn_blocking(move || match sampler.lock() {
            Ok(mut sampler) => sampler.sample(),
            Err(_) => Sample::Unavailable,
        });
        match read.await {
            Ok(sample) => sample,
            Err(e) => {
                error!("battery read failed: {e}");
                Sample::Unavailable
            }
        }
    }

    /// Log sensor outages once, not on every tick.
    fn note_sensor(&mut self, sample: &Sample) {
        let up = sample.is_available();
        match (self.sensor_up, up) {
            (Some(true) | None, false) => warn!("battery info not available"),
            (Some(false), true) => info!("battery info available again"),
            _ => {}
        }
        self.sensor_up = Some(up);
    }
}

enum Flow {
    Continue,
    Restart { immediate: bool },
    Stop,
}
