//! battmon: battery threshold alerts for Linux desktops.
//!
//! Run with:  `RUST_LOG=info battmon`
//!
//! ```text
//! battmon [run]            monitor and notify until interrupted
//! battmon status [--json]  print the current battery status once
//! ```

use anyhow::{bail, Context, Result};
use battmon_core::{AlertEngine, BatterySampler, HealthReadout, StatusLine};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: battmon [run | status [--json]]";

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] | ["run"] => {
            tracing::info!("battmon v{} starting", env!("CARGO_PKG_VERSION"));
            let path = battmon_config::default_path();
            battmon_daemon::run(&path)
                .await
                .with_context(|| format!("monitor failed (config: {})", path.display()))
        }
        ["status"] => status(false),
        ["status", "--json"] => status(true),
        other => bail!("unknown arguments: {}\n{USAGE}", other.join(" ")),
    }
}

/// Sample once and print the status line and health readout.  Never notifies.
fn status(json: bool) -> Result<()> {
    let config = battmon_config::load(battmon_config::default_path())?;
    let engine = AlertEngine::new(config.thresholds()?, config.cooldown());
    let sample = battmon_daemon::sampler_from(&config).sample();

    let status = StatusLine::describe(&sample, &engine.thresholds());
    let health = HealthReadout::from_sample(&sample);

    if json {
        let out = serde_json::json!({
            "sample": sample,
            "status": status,
            "health": health,
            "alert_condition": sample.reading().and_then(|r| engine.triggered_kind(r)),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{status}");
        println!("{health}");
    }
    Ok(())
}
