use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::CatalogSettings;

pub const ACCESS_TOKEN_FILE: &str = ".cache/access_token";

/// The configured bearer token, or the one cached at `token_file`
pub fn resolve_access_token(catalog: &CatalogSettings, token_file: &Path) -> Result<String> {
    if let Some(token) = catalog
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        tracing::debug!("Using configured access token");
        return Ok(token.to_string());
    }

    match fs::read_to_string(token_file) {
        Ok(contents) if !contents.trim().is_empty() => {
            tracing::debug!(path = %token_file.display(), "Using cached access token");
            Ok(contents.trim().to_string())
        }
        Ok(_) => bail!("access token file {} is empty", token_file.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => bail!(
            "no access token: set catalog.access_token or SOUNDTRACK__CATALOG__ACCESS_TOKEN, or write one to {}",
            token_file.display()
        ),
        Err(e) => {
            Err(e).with_context(|| format!("failed to read {}", token_file.display()))
        }
    }
}
