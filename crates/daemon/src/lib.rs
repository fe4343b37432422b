//! Battery monitor daemon.
//!
//! Wires the background tasks together:
//! - the monitor (poll timer → sampler → engine → notifier)
//! - config file watcher (live threshold / cooldown / interval reload)
//! - Unix signals (check-now, pause/resume toggle, shutdown)

pub mod monitor;
mod signals;

pub use monitor::{Monitor, MonitorHandle, MonitorSettings, TickReport, DEFAULT_INTERVAL};

use battmon_config::{ConfigWatcher, MonitorConfig, NotificationConfig};
use battmon_core::{AlertEngine, MonitorError, Notifier, Result};
use battmon_notifier::{DesktopNotifier, LogNotifier};
use battmon_system::SysfsSampler;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Load `config_path`, start monitoring, and run until a shutdown signal.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = battmon_config::load(config_path)?;
    let engine = AlertEngine::new(config.thresholds()?, config.cooldown());
    let sampler = sampler_from(&config);
    let notifier = build_notifier(&config.notification).await;
    info!(root = %sampler.root().display(), "reading battery state");

    let (handle, task) = Monitor::new(engine, sampler, notifier)
        .with_interval(config.poll_interval())
        .spawn();

    let (watcher, reloads) = ConfigWatcher::spawn(config_path);
    info!(path = %watcher.path().display(), "live config reload enabled");
    signals::spawn_controls(handle.clone());

    supervise(handle, task, reloads, signals::shutdown()).await
}

/// Feed reloaded configs to the monitor until `shutdown` resolves, then stop
/// it.  Fails with [`MonitorError::MonitorStopped`] if the monitor ends on
/// its own first.
async fn supervise(
    handle: MonitorHandle,
    mut task: JoinHandle<()>,
    mut reloads: mpsc::Receiver<MonitorConfig>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut task => {
                match res {
                    Ok(()) => error!("Monitor stopped unexpectedly"),
                    Err(e) => error!("Monitor task ended abnormally: {e}"),
                }
                return Err(MonitorError::MonitorStopped);
            }
            Some(cfg) = reloads.recv() => {
                info!("Config reloaded");
                if let Err(e) = handle.apply_config(&cfg).await {
                    error!("Failed to apply reloaded config: {e}");
                    break;
                }
            }
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    // The monitor may already be gone if it failed; nothing to stop then.
    let _ = handle.shutdown().await;
    if let Err(e) = task.await {
        error!("Monitor task ended abnormally: {e}");
    }
    Ok(())
}

/// Build the sysfs sampler described by the `[sensor]` section.
pub fn sampler_from(config: &MonitorConfig) -> SysfsSampler {
    SysfsSampler::new(
        config.sensor.sysfs_root.clone(),
        config.sensor.battery.clone(),
    )
}

/// Desktop notifications when enabled and reachable, log output otherwise.
pub async fn build_notifier(cfg: &NotificationConfig) -> Arc<dyn Notifier> {
    if !cfg.enabled {
        info!("Desktop notifications disabled; alerts go to the log only");
        return Arc::new(LogNotifier);
    }
    match DesktopNotifier::connect(cfg.app_name.clone(), cfg.timeout_secs).await {
        Ok(n) => Arc::new(n),
        Err(e) => {
            warn!("{e}; alerts go to the log only");
            Arc::new(LogNotifier)
        }
    }
}
