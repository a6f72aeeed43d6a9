//! valv: replay navigation through a configured router.
//!
//! ```text
//! valv [--config FILE] [--watch] [--json] [PATH...]
//!
//! PATH / stdin line:
//!     /some/path   navigate
//!     back         go back one history entry
//!     +N / -N      shift the trailing page number
//! ```
//!
//! Every settled resolution is printed to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use valv::app::{App, Command};
use valv::config::{load_config, ConfigWatcher, ValvConfig};
use valv::observability::logging;
use valv::render::Template;
use valv::routing::Resolution;

#[derive(Parser)]
#[command(name = "valv")]
#[command(about = "Replay paths through a configured client-side router", long_about = None)]
struct Cli {
    /// Router configuration (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload routes when the configuration file changes.
    #[arg(short, long)]
    watch: bool,

    /// Print each render as a JSON line.
    #[arg(long)]
    json: bool,

    /// Commands to replay. Read from stdin when absent.
    paths: Vec<String>,
}

#[derive(Serialize)]
struct Rendered<'a> {
    #[serde(flatten)]
    resolution: &'a Resolution,
    template: Option<Template>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ValvConfig::default(),
    };
    logging::init(&config.observability);
    tracing::info!(config = ?cli.config, "valv v0.1.0 starting");

    let app = App::start(&config)?;
    print(&app, app.settle().await, cli.json)?;

    let (mut updates, _watcher) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(rx), Some(watcher.run()?))
        }
        (None, true) => {
            tracing::warn!("--watch needs --config, not watching");
            (None, None)
        }
        _ => (None, None),
    };

    let mut commands = command_feed(cli.paths);
    loop {
        tokio::select! {
            line = commands.recv() => match line {
                Some(line) => {
                    let resolution = app.apply(Command::parse(&line)).await;
                    print(&app, resolution, cli.json)?;
                }
                None => break,
            },
            Some(config) = next_update(&mut updates) => app.reload(&config),
        }
    }

    tracing::info!("input exhausted, exiting");
    Ok(())
}

/// Commands from the arguments, or stdin lines when there are none.
fn command_feed(args: Vec<String>) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    if args.is_empty() {
        tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        });
    } else {
        for arg in args {
            // the receiver is held by the caller
            let _ = tx.send(arg);
        }
    }
    rx
}

async fn next_update(updates: &mut Option<mpsc::UnboundedReceiver<ValvConfig>>) -> Option<ValvConfig> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn print(app: &App, resolution: Option<Resolution>, json: bool) -> Result<(), serde_json::Error> {
    let Some(resolution) = resolution else {
        return Ok(());
    };
    let template = app.router().current();
    if json {
        let line = serde_json::to_string(&Rendered {
            resolution: &resolution,
            template,
        })?;
        println!("{line}");
    } else {
        let shown = template.map(|t| t.to_string()).unwrap_or_default();
        let marker = if resolution.committed { "" } else { " (unchanged)" };
        println!("{} => {}{}", resolution.path, shown, marker);
    }
    Ok(())
}
