use crate::schema::MonitorConfig;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Watches the config file and delivers a freshly parsed [`MonitorConfig`]
/// after every write.
///
/// Files that fail to parse or validate are logged and skipped, so the
/// receiver only ever sees usable configurations.  The file's directory does
/// not need to exist yet: until it does, the nearest existing ancestor is
/// watched instead.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// let path = "/home/user/.config/battmon/battmon.toml";
/// let (_watcher, mut rx) = battmon_config::ConfigWatcher::spawn(path);
/// while let Some(cfg) = rx.recv().await {
///     println!("new thresholds: {:?}", cfg.thresholds);
/// }
/// # }
/// ```
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    /// Spawn a filesystem watcher for `path` on the current Tokio runtime.
    pub fn spawn(path: impl AsRef<Path>) -> (Self, mpsc::Receiver<MonitorConfig>) {
        let (tx, rx) = mpsc::channel(1);
        let path = path.as_ref().to_path_buf();
        let watcher = Self { path: path.clone() };

        tokio::spawn(watch_loop(path, tx));

        (watcher, rx)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn watch_loop(path: PathBuf, tx: mpsc::Sender<MonitorConfig>) {
    use notify::{Config, Event, EventKind};
    use std::time::Duration;

    let (fs_tx, mut fs_rx) = mpsc::channel::<notify::Result<Event>>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = fs_tx.blocking_send(res);
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    ) {
        Ok(w) => w,
        Err(e) => {
            warn!("Live reload disabled, cannot create filesystem watcher: {e}");
            return;
        }
    };

    // Editors often replace the file, which drops a watch on the file
    // itself; watch the parent directory and filter by name instead.
    let config_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let mut watched = nearest_existing(&config_dir);
    if let Err(e) = watcher.watch(&watched, RecursiveMode::NonRecursive) {
        warn!("Live reload disabled, cannot watch '{}': {e}", watched.display());
        return;
    }
    if watched == config_dir {
        debug!("Watching config file: {}", path.display());
    } else {
        info!(
            "'{}' does not exist yet; watching '{}' until it does",
            config_dir.display(),
            watched.display()
        );
    }

    while let Some(event) = fs_rx.recv().await {
        let event = match event {
            Ok(e) => e,
            Err(e) => {
                warn!("Watcher error: {e}");
                continue;
            }
        };

        if watched != config_dir {
            if descend(&mut watcher, &mut watched, &config_dir) && path.is_file() {
                // Created together with its directory; no event will follow.
                if !deliver(&path, &tx).await {
                    break;
                }
            }
            continue;
        }

        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            continue;
        }
        if !event.paths.iter().any(|p| p.file_name() == path.file_name()) {
            continue;
        }
        if !deliver(&path, &tx).await {
            break; // receiver dropped
        }
    }
}

/// Re-parse `path` and send it on.  Returns `false` once the receiver is gone.
async fn deliver(path: &Path, tx: &mpsc::Sender<MonitorConfig>) -> bool {
    match crate::load(path) {
        Ok(cfg) => tx.send(cfg).await.is_ok(),
        Err(e) => {
            warn!("Ignoring config change in '{}': {e}", path.display());
            true
        }
    }
}

/// Move the watch down towards `config_dir` as directories appear.  Returns
/// `true` once `config_dir` itself is watched.
fn descend(watcher: &mut RecommendedWatcher, watched: &mut PathBuf, config_dir: &Path) -> bool {
    // `mkdir -p` can create several levels before we get to look.
    loop {
        let next = nearest_existing(config_dir);
        if next == *watched {
            return *watched == config_dir;
        }
        if let Err(e) = watcher.watch(&next, RecursiveMode::NonRecursive) {
            warn!("Cannot watch '{}': {e}", next.display());
            return false;
        }
        let _ = watcher.unwatch(watched);
        debug!("Now watching '{}'", next.display());
        *watched = next;
        if *watched == config_dir {
            info!("Config directory '{}' appeared", config_dir.display());
        }
    }
}

fn nearest_existing(dir: &Path) -> PathBuf {
    dir.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.is_dir())
        .unwrap_or(Path::new("."))
        .to_path_buf()
}
