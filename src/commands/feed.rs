//! Feed and view commands
//!
//! Both run on top of [`SnapViewer`], so the terminal gets the same
//! guarantees as any other front end: one snap at a time, a one-second
//! countdown, and exactly one "mark seen" per opened snap.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use colored::Colorize;
use prettytable::{format, row, Table};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::{FluxNovaError, Result};
use crate::media;
use crate::viewer::{
    Acknowledgement, CloseOutcome, OpenOutcome, SnapSummary, SnapViewer, ViewerPhase,
    UNKNOWN_SENDER,
};

use super::session_backend;

/// Human-readable age of a snap ("5m ago")
pub fn format_age(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created_at) = created_at else {
        return "-".to_string();
    };
    let secs = (now - created_at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

fn print_feed(entries: &[SnapSummary], now: DateTime<Utc>) {
    if entries.is_empty() {
        println!("{}", "No pending snaps.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["ID".bold(), "From".bold(), "Sent".bold()]);
    for entry in entries {
        table.add_row(row![
            entry.id.cyan(),
            entry.sender.username,
            format_age(entry.created_at, now)
        ]);
    }

    println!("\nPending snaps:");
    table.printstd();
    println!();
    println!("Use {} to open one.", "fluxnova view <ID>".cyan());
}

/// Poll once and print the feed
pub async fn show_feed(config: &Config) -> Result<()> {
    let (backend, _) = session_backend(config)?;
    let viewer = SnapViewer::new(Arc::new(backend));
    viewer.poll_now().await?;
    print_feed(&viewer.feed(), Utc::now());
    Ok(())
}

/// Keep polling and reprint the feed whenever it changes, until Ctrl-C
pub async fn watch_feed(config: &Config) -> Result<()> {
    let (backend, _) = session_backend(config)?;
    let interval = config.viewer.poll_interval();
    let viewer = SnapViewer::start(Arc::new(backend), interval);

    println!("Watching for snaps (Ctrl-C to stop)...");
    let mut printed = None;
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let version = viewer.feed_version();
                if printed != Some(version) {
                    printed = Some(version);
                    print_feed(&viewer.feed(), Utc::now());
                }
            }
        }
    }

    viewer.teardown();
    Ok(())
}

/// Forward each line typed on stdin as a dismissal request.
///
/// Blocking stdin reads live on their own thread so a pending read never
/// holds up runtime shutdown.
fn spawn_enter_listener() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let mut line = String::new();
        while matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            if tx.blocking_send(()).is_err() {
                break;
            }
            line.clear();
        }
    });
    rx
}

/// `path`, with the image's extension added when it has none
fn output_path(path: &Path, mime: Option<&str>) -> PathBuf {
    match (path.extension(), mime.and_then(media::extension_for)) {
        (None, Some(ext)) => path.with_extension(ext),
        _ => path.to_path_buf(),
    }
}

fn print_remaining(remaining_secs: u32) {
    print!("\r  {} {:>2}s ", "⏱".bold(), remaining_secs);
    let _ = std::io::stdout().flush();
}

/// Open a snap, count down, and close it on Enter or when time is up
///
/// With `output`, the decoded image is written there while the snap is
/// displayed and deleted once it closes. Ctrl-C abandons the snap without
/// marking it seen.
///
/// # Errors
///
/// Returns [`FluxNovaError::InvalidInput`] if the snap cannot be opened.
pub async fn view_snap(config: &Config, snap_id: &str, output: Option<&Path>) -> Result<()> {
    let (backend, _) = session_backend(config)?;
    let viewer = SnapViewer::new(Arc::new(backend));
    if let Err(e) = viewer.poll_now().await {
        tracing::warn!("Could not load the feed: {}", e);
    }
    let sender = viewer
        .feed()
        .into_iter()
        .find(|s| s.id == snap_id)
        .map(|s| s.sender.username)
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let duration_secs = match viewer.open(snap_id).await {
        OpenOutcome::Opened { duration_secs } => duration_secs,
        OpenOutcome::AlreadySeen => {
            return Err(FluxNovaError::InvalidInput(format!(
                "snap {} was already viewed",
                snap_id
            ))
            .into())
        }
        OpenOutcome::Unavailable | OpenOutcome::AlreadyActive | OpenOutcome::TornDown => {
            return Err(FluxNovaError::InvalidInput(format!(
                "snap {} is not available",
                snap_id
            ))
            .into())
        }
    };

    let written = match (output, viewer.controller().image()) {
        (Some(path), Some(image)) => {
            let path = output_path(path, image.mime.as_deref());
            tokio::fs::write(&path, &image.bytes).await?;
            println!("Image written to {}", path.display().to_string().cyan());
            Some(path)
        }
        _ => None,
    };

    println!(
        "Snap from {} ({}s). Press {} to dismiss.",
        sender.bold(),
        duration_secs,
        "Enter".cyan()
    );
    print_remaining(duration_secs);

    let mut phase = viewer.controller().subscribe();
    let mut dismiss = spawn_enter_listener();
    let mut dismissed = None;
    let mut abandoned = false;
    loop {
        tokio::select! {
            changed = phase.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = phase.borrow_and_update().clone();
                match current {
                    ViewerPhase::Active { remaining_secs, .. } => print_remaining(remaining_secs),
                    ViewerPhase::Idle => break,
                    ViewerPhase::Opening { .. } | ViewerPhase::Closing { .. } => {}
                }
            }
            Some(()) = dismiss.recv() => {
                dismissed = Some(viewer.close().await);
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                viewer.teardown();
                abandoned = true;
                break;
            }
        }
    }
    println!();

    if let Some(path) = written {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }

    if abandoned {
        println!("{}", "Snap abandoned; it stays in your feed.".yellow());
        return Ok(());
    }
    match dismissed {
        Some(CloseOutcome::Closed {
            acknowledgement: Acknowledgement::Failed,
            ..
        }) => println!("{}", "Closed, but the backend did not confirm it as seen.".yellow()),
        Some(_) => println!("{}", "Snap dismissed.".green()),
        None => println!("{}", "Time's up.".green()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(None, now), "-");
        assert_eq!(format_age(Some(now - Duration::seconds(10)), now), "just now");
        assert_eq!(format_age(Some(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_age(Some(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(format_age(Some(now - Duration::days(2)), now), "2d ago");
    }

    #[test]
    fn test_output_path_adds_missing_extension() {
        assert_eq!(
            output_path(Path::new("snap"), Some("image/png")),
            PathBuf::from("snap.png")
        );
        assert_eq!(
            output_path(Path::new("snap.img"), Some("image/png")),
            PathBuf::from("snap.img")
        );
        assert_eq!(output_path(Path::new("snap"), None), PathBuf::from("snap"));
    }

    #[test]
    fn test_format_age_future_timestamp() {
        let now = Utc::now();
        assert_eq!(format_age(Some(now + Duration::minutes(5)), now), "just now");
    }
}
