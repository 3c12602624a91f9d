//! Runtime settings
//!
//! Precedence (highest wins):
//! 1) Environment variables (prefix `SOUNDTRACK__`, `__` as nested separator)
//! 2) Config file (TOML, if present)
//! 3) Struct defaults

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::controller::{
    DEFAULT_MAX_SUGGESTIONS, DEFAULT_PLAYLIST_DESCRIPTION, DEFAULT_PLAYLIST_NAME,
    DEFAULT_POPULARITY_THRESHOLD, DEFAULT_TOLERANCE,
};
use crate::model::{
    PlaylistCreateRequest, DEFAULT_API_BASE_URL, DESIRED_THUMBNAIL_WIDTH, PLAYLIST_ID_FILE,
};

const ENV_PREFIX: &str = "SOUNDTRACK";
const CONFIG_PATH_VAR: &str = "SOUNDTRACK_CONFIG_PATH";

/// The catalog caps saved-track pages at this size
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub soundtrack: SoundtrackSettings,
    pub playlist: PlaylistSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    /// Bearer token; when empty the token file is used instead
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl CatalogSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoundtrackSettings {
    /// Albums and episodes further than this from the journey are dropped
    pub tolerance_mins: u64,
    /// Albums and episodes suggested, each
    pub max_suggestions: usize,
    pub thumbnail_width: u32,
    /// Only tracks strictly more popular than this are used
    pub popularity_threshold: u32,
    pub saved_track_pages: u32,
    pub saved_track_page_size: u32,
    pub podcast_show_limit: u32,
    pub episodes_per_show: u32,
    /// Draw tracks from this playlist instead of the saved tracks
    pub seed_playlist: Option<String>,
}

impl Default for SoundtrackSettings {
    fn default() -> Self {
        Self {
            tolerance_mins: DEFAULT_TOLERANCE.as_secs() / 60,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            thumbnail_width: DESIRED_THUMBNAIL_WIDTH,
            popularity_threshold: DEFAULT_POPULARITY_THRESHOLD,
            saved_track_pages: 2,
            saved_track_page_size: MAX_PAGE_SIZE,
            podcast_show_limit: 5,
            episodes_per_show: 5,
            seed_playlist: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaylistSettings {
    pub name: String,
    pub description: String,
    pub id_file: PathBuf,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_PLAYLIST_NAME.to_string(),
            description: DEFAULT_PLAYLIST_DESCRIPTION.to_string(),
            id_file: PathBuf::from(PLAYLIST_ID_FILE),
        }
    }
}

impl PlaylistSettings {
    pub fn create_request(&self) -> PlaylistCreateRequest {
        PlaylistCreateRequest::private(&self.name, &self.description)
    }
}

impl Settings {
    /// Load settings from the resolved config file and the environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(resolve_config_path);
        Self::load_from(path.as_deref(), true)
    }

    /// Load from `path` (missing file is fine), optionally layering the
    /// environment on top
    pub fn load_from(
        path: Option<&Path>,
        with_env: bool,
    ) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "Reading config file");
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        if with_env {
            builder = builder.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        let soundtrack = &self.soundtrack;
        if soundtrack.max_suggestions == 0 {
            return Err("soundtrack.max_suggestions must be >= 1".to_string());
        }
        if soundtrack.saved_track_page_size == 0 || soundtrack.saved_track_page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "soundtrack.saved_track_page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }
        if self.catalog.request_timeout_secs == 0 {
            return Err("catalog.request_timeout_secs must be >= 1".to_string());
        }
        if self.playlist.name.trim().is_empty() {
            return Err("playlist.name must not be empty".to_string());
        }
        Ok(())
    }
}

/// `SOUNDTRACK_CONFIG_PATH`, else `$XDG_CONFIG_HOME/soundtrack-rs/config.toml`
/// or `~/.config/soundtrack-rs/config.toml`
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(p));
    }
    let config_home = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
    config_home.map(|dir| dir.join("soundtrack-rs").join("config.toml"))
}
