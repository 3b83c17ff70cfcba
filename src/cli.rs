use crate::client::TrackingClient;
use crate::history::HistoryFormatter;
use crate::map::{MapConfig, MapSync, ViewportBackend};
use crate::model::TrackConfig;
use crate::presenter::{DisplayModel, TrackingPresenter};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

enum Stream {
    Stdout,
    Stderr,
}

/// Line printer backed by a blocking thread, so async code never writes to
/// the terminal directly. Dropping it without `finish` may lose lines.
struct Printer {
    tx: mpsc::UnboundedSender<(Stream, String)>,
    handle: tokio::task::JoinHandle<()>,
}

impl Printer {
    fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Stream, String)>();
        let handle = tokio::task::spawn_blocking(move || {
            let mut out = std::io::LineWriter::new(std::io::stdout().lock());
            let mut err = std::io::LineWriter::new(std::io::stderr().lock());
            while let Some((stream, line)) = rx.blocking_recv() {
                let sink: &mut dyn Write = match stream {
                    Stream::Stdout => &mut out,
                    Stream::Stderr => &mut err,
                };
                let _ = writeln!(sink, "{line}");
            }
            let _ = out.flush();
            let _ = err.flush();
        });
        Self { tx, handle }
    }

    fn out(&self, line: impl Into<String>) {
        let _ = self.tx.send((Stream::Stdout, line.into()));
    }

    fn err(&self, line: impl Into<String>) {
        let _ = self.tx.send((Stream::Stderr, line.into()));
    }

    async fn finish(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "cainiao-track",
    version,
    about = "Track a Cainiao parcel: stage progress, history and last known position"
)]
pub struct Cli {
    /// Tracking number to look up (optional in the TUI, where it can be typed in)
    pub tracking_number: Option<String>,

    /// Item name to store with the tracking number; implies --register
    #[arg(long)]
    pub item_name: Option<String>,

    /// Register the tracking number with the backend before fetching it
    #[arg(long)]
    pub register: bool,

    /// Base URL of the tracking backend
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub base_url: String,

    /// Request timeout
    #[arg(long, default_value = "10s")]
    pub timeout: humantime::Duration,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write the rendered result as JSON to this path
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Item name to register with, if registration was requested.
    pub fn registration(&self) -> Option<String> {
        match (&self.item_name, self.register) {
            (Some(name), _) => Some(name.clone()),
            (None, true) => Some(String::new()),
            (None, false) => None,
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_once(args, false).await;
        }
    }

    run_once(args.clone(), args.json).await
}

/// Build a `TrackConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> TrackConfig {
    TrackConfig {
        base_url: args.base_url.clone(),
        timeout: Duration::from(args.timeout),
        user_agent: format!("cainiao-track/{}", env!("CARGO_PKG_VERSION")),
        map: MapConfig::default(),
    }
}

pub fn build_presenter(cfg: &TrackConfig) -> TrackingPresenter<ViewportBackend> {
    TrackingPresenter::new(
        HistoryFormatter::local(),
        MapSync::new(ViewportBackend::default(), cfg.map.clone()),
    )
}

/// Fetch once, render once, print, exit.
async fn run_once(args: Cli, json: bool) -> Result<()> {
    crate::logging::init_stderr(&args.log_level);
    let tracking_number = args
        .tracking_number
        .clone()
        .filter(|t| !t.trim().is_empty())
        .context("a tracking number is required with --json/--text")?;

    let cfg = build_config(&args);
    tracing::debug!(?cfg, "starting lookup");
    let client = TrackingClient::new(&cfg)?;
    let printer = Printer::spawn();

    let registration = args.registration();
    if registration.is_some() {
        printer.err(format!("Registering {tracking_number}…"));
    }
    let snapshot = crate::orchestrator::lookup(
        &client,
        &tracking_number,
        registration.as_deref(),
        None,
    )
    .await
    .with_context(|| format!("track {tracking_number}"))?;

    let mut presenter = build_presenter(&cfg);
    let model = presenter.render(&snapshot, time::OffsetDateTime::now_utc());

    handle_exports(&args, &model)?;

    if json {
        let out = serde_json::to_string_pretty(&model)?;
        printer.out(out);
    } else {
        let summary = crate::text_summary::build_text_summary(&model, presenter.map());
        for line in summary.lines {
            printer.out(line);
        }
    }
    if let Some(p) = args.export_json.as_deref() {
        printer.err(format!("Exported: {}", p.display()));
    }

    printer.finish().await;
    Ok(())
}

/// Write the rendered model to `--export-json`, if set.
pub(crate) fn handle_exports(args: &Cli, model: &DisplayModel) -> Result<()> {
    if let Some(p) = args.export_json.as_deref() {
        export_json(p, model)?;
    }
    Ok(())
}

pub(crate) fn export_json(path: &std::path::Path, model: &DisplayModel) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(model)?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let args = Cli::parse_from(["cainiao-track", "LP1"]);
        assert_eq!(args.tracking_number.as_deref(), Some("LP1"));
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "http://127.0.0.1:5000");
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert!(cfg.user_agent.starts_with("cainiao-track/"));
        assert_eq!(args.registration(), None);
    }

    #[test]
    fn item_name_implies_registration() {
        let args = Cli::parse_from(["cainiao-track", "LP1", "--item-name", "Mug"]);
        assert_eq!(args.registration().as_deref(), Some("Mug"));

        let bare = Cli::parse_from(["cainiao-track", "LP1", "--register", "--timeout", "3s"]);
        assert_eq!(bare.registration().as_deref(), Some(""));
        assert_eq!(build_config(&bare).timeout, Duration::from_secs(3));
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = std::env::temp_dir().join(format!("cainiao-track-test-{}", std::process::id()));
        let path = dir.join("nested").join("out.json");
        let mut presenter = build_presenter(&build_config(&Cli::parse_from(["cainiao-track"])));
        let snap = crate::model::TrackingSnapshot {
            tracking_number: "LP9".into(),
            item_name: String::new(),
            status: "配達済".into(),
            status_class: Some("status-delivered".into()),
            last_updated: "2024-03-01".into(),
            history: Vec::new(),
            current_location: None,
        };
        let model = presenter.render(&snap, time::OffsetDateTime::now_utc());
        export_json(&path, &model).unwrap();

        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["tracking_number"], "LP9");
        assert_eq!(back["fill_width_percent"], 90.0);
        assert_eq!(back["marker"]["action"], "unchanged");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
