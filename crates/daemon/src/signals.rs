use crate::monitor::MonitorHandle;
use tracing::{info, warn};

/// Resolve on Ctrl-C or, on Unix, `SIGTERM`.
pub(crate) async fn shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Cannot listen for SIGTERM: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// `SIGUSR1` runs a check immediately; `SIGUSR2` pauses or resumes polling.
#[cfg(unix)]
pub(crate) fn spawn_controls(handle: MonitorHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut usr1, mut usr2) = match (
            signal(SignalKind::user_defined1()),
            signal(SignalKind::user_defined2()),
        ) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Control signals unavailable: {e}");
                return;
            }
        };

        loop {
            let result = tokio::select! {
                Some(()) = usr1.recv() => {
                    info!("SIGUSR1: checking now");
                    handle.check_now().await.map(|report| {
                        info!("{}  {}", report.status, report.health);
                    })
                }
                Some(()) = usr2.recv() => handle.toggle().await,
                else => break,
            };
            if result.is_err() {
                break; // monitor stopped
            }
        }
    });
}

#[cfg(not(unix))]
pub(crate) fn spawn_controls(_handle: MonitorHandle) {}
