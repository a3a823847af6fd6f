//! Plex Monitor
//! Terminal monitor for active sessions, playlists and item metadata on a Plex Media Server

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

mod api;
mod config;
mod display;
mod error;
mod logging;
mod menu;
mod models;
mod monitor;
mod xml_parser;

#[cfg(test)]
mod test_support;

use api::PlexClient;
use config::{AppConfig, ConfigOverrides};
use menu::Menu;
use monitor::ActiveMonitor;

#[derive(Parser, Debug)]
#[command(name = "plex-monitor", version)]
#[command(about = "Monitor Plex Media Server activity", long_about = None)]
struct Args {
    /// Config file (default: <config dir>/plex_monitor/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plex server base URL
    #[arg(long, env = "PLEX_SERVER")]
    server: Option<String>,

    /// plex.tv account username
    #[arg(long, env = "PLEX_USERNAME")]
    username: Option<String>,

    /// plex.tv account password
    #[arg(long, env = "PLEX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Existing auth token; skips sign-in
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Sign-in provider base URL
    #[arg(long, env = "PLEX_PROVIDER_URL")]
    provider_url: Option<String>,

    /// Log file path
    #[arg(long, env = "PLEX_MONITOR_LOG_FILE")]
    log_file: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PLEX_MONITOR_LOG_LEVEL")]
    log_level: Option<String>,

    /// HTTP timeout in seconds (default: none)
    #[arg(long, env = "PLEX_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server: self.server.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            token: self.token.clone(),
            provider_url: self.provider_url.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
            http_timeout_secs: self.http_timeout_secs,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Variables from a .env file feed the env-backed arguments
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logging depends on the config, so config problems are reported afterwards
    let (mut config, config_error) = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    config.apply_overrides(args.overrides());

    logging::init_logging(&config.log_level, &config.log_file)?;
    if let Some(e) = config_error {
        warn!("{}; using defaults", e);
    }

    let active = ActiveMonitor::default();
    let handler = active.clone();
    ctrlc::set_handler(move || {
        // Outside monitoring, or on a repeat while a request hangs, the program ends
        if handler.interrupt().ends_process() {
            std::process::exit(130);
        }
    })?;

    let client = PlexClient::new(&config);
    if !client.has_token() {
        warn!("No Plex token available; server requests will be refused");
    }
    let interval = config.monitor_interval_secs.max(1);

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&client, stdin.lock(), stdout.lock(), active, interval).run()?;

    Ok(())
}
