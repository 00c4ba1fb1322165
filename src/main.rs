//! Adaptive Monitor CLI
//!
//! Replays recorded observation logs or a synthetic session through the
//! engine and exports the result.

use adaptive_monitor::{
    capture::ReplaySource, synthetic_observations, Config, Monitor, MonitorConfig, VERSION,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adaptive-monitor")]
#[command(version = VERSION)]
#[command(about = "Real-time signal fusion and rolling-window analytics", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Use this configuration file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON Lines observation log through the engine
    Replay {
        /// Observation log, one JSON object per line
        #[arg(long, short)]
        input: PathBuf,

        /// Output directory for the session export
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Dashboard look-back window in minutes
        #[arg(long)]
        window_mins: Option<u64>,

        /// Forward every Nth frame (overrides the configuration)
        #[arg(long)]
        frame_skip: Option<u32>,
    },

    /// Run a synthetic session and print the dashboard report
    Demo {
        /// Number of frames to generate
        #[arg(long, default_value = "600")]
        frames: usize,

        /// Seconds between generated frames
        #[arg(long, default_value = "1")]
        interval_secs: i64,

        /// Also write the session export to this directory
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Replay {
            input,
            output,
            window_mins,
            frame_skip,
        } => {
            let config = load_config(&config_path)?;
            cmd_replay(config, &input, output, window_mins, frame_skip)
        }
        Commands::Demo {
            frames,
            interval_secs,
            output,
        } => {
            let config = load_config(&config_path)?;
            cmd_demo(config, frames, interval_secs, output)
        }
        Commands::Config => cmd_config(&config_path),
        Commands::InitConfig { force } => cmd_init_config(&config_path, force),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load_from(path).with_context(|| format!("failed to load config from {path:?}"))
}

fn monitor_config(config: &Config, window_mins: Option<u64>, frame_skip: Option<u32>) -> MonitorConfig {
    let mut monitor = config.monitor.clone();
    if let Some(mins) = window_mins {
        monitor.report_window = Duration::from_secs(mins.saturating_mul(60));
    }
    if let Some(skip) = frame_skip {
        monitor.frame_skip = skip.max(1);
    }
    monitor
}

fn cmd_replay(
    config: Config,
    input: &Path,
    output: Option<PathBuf>,
    window_mins: Option<u64>,
    frame_skip: Option<u32>,
) -> Result<()> {
    println!("Adaptive Monitor v{VERSION}");
    println!();

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read observation log {input:?}"))?;
    let source = ReplaySource::from_jsonl(&content)
        .with_context(|| format!("failed to parse observation log {input:?}"))?;
    println!("Replaying {} observations from {:?}", source.remaining(), input);

    let monitor = Monitor::new(monitor_config(&config, window_mins, frame_skip));

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(Arc::clone(&running))?;

    monitor
        .start_capture(Box::new(source))
        .context("failed to start capture")?;
    println!("Press Ctrl+C to stop");
    println!();

    while running.load(Ordering::SeqCst) && monitor.is_capturing() {
        thread::sleep(Duration::from_millis(500));
        println!("[{}] {}", Utc::now().format("%H:%M:%S"), monitor.dashboard_data().status_line());
    }

    monitor.stop().context("failed to stop session")?;

    let report = monitor.dashboard_data();
    println!();
    println!("{}", report.status_line());

    let export_dir = output.unwrap_or(config.export_path);
    write_export(&monitor, &export_dir)?;

    println!();
    println!("{}", monitor.stats_summary());
    Ok(())
}

fn cmd_demo(config: Config, frames: usize, interval_secs: i64, output: Option<PathBuf>) -> Result<()> {
    let (start, interval) = demo_timeline(Utc::now(), frames, interval_secs)?;

    let monitor = Monitor::new(config.monitor.clone());
    monitor.start().context("failed to start session")?;

    for observation in synthetic_observations(start, frames, interval) {
        if let Err(e) = monitor.submit_frame(observation) {
            warn!(error = %e, "demo frame rejected");
        }
    }

    monitor.stop().context("failed to stop session")?;

    let report = monitor.dashboard_data();
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );

    if let Some(dir) = output {
        write_export(&monitor, &dir)?;
    }

    eprintln!("{}", monitor.stats_summary());
    Ok(())
}

/// Start time and spacing for `frames` demo frames ending at `now`.
fn demo_timeline(
    now: DateTime<Utc>,
    frames: usize,
    interval_secs: i64,
) -> Result<(DateTime<Utc>, chrono::Duration)> {
    let interval_secs = interval_secs.max(1);
    let interval = chrono::Duration::try_seconds(interval_secs)
        .with_context(|| format!("interval of {interval_secs}s is out of range"))?;
    let start = i64::try_from(frames)
        .ok()
        .and_then(|n| n.checked_mul(interval_secs))
        .and_then(chrono::Duration::try_seconds)
        .and_then(|span| now.checked_sub_signed(span))
        .with_context(|| {
            format!("{frames} frames at {interval_secs}s intervals do not fit the time range")
        })?;
    Ok((start, interval))
}

fn cmd_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("failed to serialize config")?
    );
    Ok(())
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("Config file already exists at {:?} (use --force to overwrite)", path);
    }

    let config = Config::default();
    config
        .save_to(path)
        .with_context(|| format!("failed to write config to {path:?}"))?;
    config
        .ensure_directories()
        .context("failed to create data directories")?;

    println!("Wrote default configuration to {path:?}");
    Ok(())
}

fn write_export(monitor: &Monitor, dir: &Path) -> Result<()> {
    let export = monitor.export_session();
    let path = dir.join(format!(
        "session_{}.json",
        export.exported_at.format("%Y%m%d_%H%M%S")
    ));

    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
    let json = export.to_json_pretty().context("failed to serialize session export")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {path:?}"))?;

    info!(
        records = export.records.len(),
        alerts = export.alerts.len(),
        "session exported"
    );
    println!("Exported {} records to {:?}", export.records.len(), path);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_timeline() {
        let now = Utc::now();
        let (start, interval) = demo_timeline(now, 600, 1).unwrap();
        assert_eq!(start, now - chrono::Duration::minutes(10));
        assert_eq!(interval, chrono::Duration::seconds(1));
    }

    #[test]
    fn test_demo_timeline_rejects_oversized_runs() {
        let now = Utc::now();
        assert!(demo_timeline(now, usize::MAX, 1).is_err());
        assert!(demo_timeline(now, 3_000_000_000, 3_600).is_err());
        assert!(demo_timeline(now, 10, i64::MAX).is_err());
    }
}
