mod api;
mod content;
mod dismiss;
mod schedule;
mod site;
mod summary;

use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use clap::Parser;
use tracing::info;

use crate::api::{ApiServer, ApiServerConfig, ApiState};
use crate::content::ResourceDir;
use crate::dismiss::DismissStore;
use crate::site::{Clock, Site};

#[derive(Parser, Debug)]
#[command(
    name = "cbhs-site",
    version,
    about = "Schedule, announcements and status backend for the CBHS Minecraft server site"
)]
struct Cli {
    /// Directory holding the site's JSON resources.
    #[arg(long, default_value = "res")]
    resources: PathBuf,

    /// File that remembers "don't show again today" modal dismissals.
    /// Without it, dismissals last until the process exits.
    #[arg(long)]
    dismiss_store: Option<PathBuf>,

    /// Pin the reference instant (RFC 3339) instead of reading the system clock.
    #[arg(long)]
    now: Option<String>,

    #[arg(long, default_value = "Central time")]
    timezone_label: String,

    /// Print a text digest and exit instead of serving the API.
    #[arg(long)]
    summary: bool,

    /// After the digest, keep printing countdowns until they finish.
    #[arg(long)]
    follow: bool,

    #[arg(long, default_value = "127.0.0.1")]
    api_bind: String,

    #[arg(long, default_value_t = 8099)]
    api_port: u16,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if !cli.resources.is_dir() {
        bail!(
            "resources directory {} does not exist",
            cli.resources.display()
        );
    }
    let clock = match cli.now.as_deref() {
        Some(raw) => Clock::Fixed(parse_now(raw)?),
        None => Clock::System,
    };
    let site = Site::new(
        ResourceDir::new(&cli.resources),
        clock,
        cli.timezone_label.clone(),
    );
    let dismissed = match cli.dismiss_store.as_deref() {
        Some(path) => DismissStore::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => DismissStore::in_memory(),
    };
    if !dismissed.is_empty() {
        info!(entries = dismissed.len(), "loaded modal dismissals");
    }

    if cli.summary || cli.follow {
        print!("{}", summary::render_summary(&site, &dismissed)?);
        if cli.follow {
            summary::follow_countdowns(&site)?;
        }
        return Ok(());
    }

    let api_server = ApiServer::start(
        ApiServerConfig {
            bind_addr: cli.api_bind.clone(),
            port: cli.api_port,
        },
        ApiState {
            site,
            dismissed: Mutex::new(dismissed),
        },
    )
    .with_context(|| {
        format!(
            "failed to start site API at {}:{}",
            cli.api_bind, cli.api_port
        )
    })?;

    while api_server.is_running() {
        thread::sleep(Duration::from_millis(500));
    }
    info!("site API stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_now(raw: &str) -> Result<DateTime<Local>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("--now must be an RFC 3339 timestamp, got {raw:?}"))?;
    Ok(parsed.with_timezone(&Local))
}
