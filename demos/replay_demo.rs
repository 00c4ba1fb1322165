//! Feed a synthetic detector through a channel source and poll the dashboard
//! while the producer thread runs.
//!
//! Run with `cargo run --example replay_demo`.

use adaptive_monitor::capture::SourceError;
use adaptive_monitor::{synthetic_observations, ChannelSource, Monitor, MonitorConfig};
use chrono::{Duration, Utc};
use std::thread;
use std::time::Duration as StdDuration;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let monitor = Monitor::new(MonitorConfig {
        frame_skip: 1,
        ..MonitorConfig::default()
    });

    let (source, sender) = ChannelSource::new(256);
    monitor.start_capture(Box::new(source))?;

    let detector = thread::spawn(move || {
        let start = Utc::now() - Duration::minutes(40);
        for observation in synthetic_observations(start, 480, Duration::seconds(5)) {
            loop {
                match sender.send(observation.clone()) {
                    Ok(()) => break,
                    // Retry while the producer catches up.
                    Err(SourceError::QueueFull) => thread::sleep(StdDuration::from_millis(1)),
                    Err(_) => return,
                }
            }
            thread::sleep(StdDuration::from_millis(2));
        }
    });

    while !detector.is_finished() {
        thread::sleep(StdDuration::from_millis(250));
        println!("{}", monitor.dashboard_data().status_line());
    }
    if detector.join().is_err() {
        anyhow::bail!("detector thread panicked");
    }

    // Let the producer drain the queue before stopping.
    thread::sleep(StdDuration::from_millis(200));
    monitor.stop()?;

    let report = monitor.dashboard_data();
    println!();
    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    println!("Recommendations: {:?}", report.recommendations);
    println!("{}", monitor.stats_summary());
    Ok(())
}
