use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use soundtrack_rs::auth::{resolve_access_token, ACCESS_TOKEN_FILE};
use soundtrack_rs::config::Settings;
use soundtrack_rs::controller::{PlaylistIdentityManager, SoundtrackComposer};
use soundtrack_rs::logging;
use soundtrack_rs::model::{PlaylistIdStore, Route, SpotifyClient};
use soundtrack_rs::view;

/// Compose something to listen to for a planned journey
#[derive(Parser, Debug)]
#[command(name = "soundtrack-rs", version, about)]
struct Cli {
    /// Route JSON: {"duration_secs": .., "legs": [{"mode": "transit", "travel_duration_secs": ..}]}
    route: PathBuf,

    /// Config file (defaults to SOUNDTRACK_CONFIG_PATH or the XDG location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the soundtrack as JSON instead of a listing
    #[arg(long)]
    json: bool,

    /// Give up on the whole composition after this many seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("=== soundtrack-rs starting ===");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {
            tracing::info!("soundtrack-rs finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = ?err, "Composition failed");
            eprintln!("An error occurred: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    settings
        .validate()
        .map_err(|e| anyhow!("invalid settings: {}", e))?;

    let route = read_route(&cli.route)?;

    let token = resolve_access_token(&settings.catalog, Path::new(ACCESS_TOKEN_FILE))?;
    let client = SpotifyClient::with_base_url(
        &settings.catalog.base_url,
        &token,
        settings.catalog.request_timeout(),
    )?;
    let catalog = Arc::new(client);

    let playlists = PlaylistIdentityManager::new(
        catalog.clone(),
        PlaylistIdStore::new(&settings.playlist.id_file),
        settings.playlist.create_request(),
    );
    let composer = SoundtrackComposer::new(catalog, playlists, settings.soundtrack.clone());

    let playables = tokio::select! {
        result = tokio::time::timeout(Duration::from_secs(cli.timeout_secs), composer.compose(&route)) => {
            result.map_err(|_| anyhow!("timed out after {} seconds", cli.timeout_secs))??
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling composition");
            return Err(anyhow!("interrupted"));
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&playables)?);
    } else {
        print!("{}", view::render_soundtrack(&route, &playables));
    }
    Ok(())
}

fn read_route(path: &Path) -> Result<Route> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route {}", path.display()))?;
    let route: Route = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse route {}", path.display()))?;
    tracing::debug!(duration_secs = route.duration_secs, legs = route.legs.len(), "Loaded route");
    Ok(route)
}
