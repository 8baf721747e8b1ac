// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
use ab_glyph::FontVec;
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where the label font is fetched from when none is cached
pub const FONT_URL: &str = "https://ultralytics.com/assets/Arial.ttf";
const FONT_FILE: &str = "Arial.ttf";
const CACHE_DIR: &str = "ppe-detect";

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create the output directory (and parents) if missing. Existing contents
/// are left alone.
pub fn ensure_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

pub fn font_cache_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CACHE_DIR).join(FONT_FILE))
}

/// Load the label font: an explicit path, else the cached copy, else a fresh
/// download into the cache.
pub fn load_font(path: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = path {
        return read_font(path);
    }

    let cached = font_cache_path().context("no config directory for the font cache")?;
    if cached.exists() {
        return read_font(&cached);
    }

    info!("Downloading {} to {}", FONT_URL, cached.display());
    let bytes = download(FONT_URL)?;
    if let Some(parent) = cached.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if let Err(e) = fs::write(&cached, &bytes) {
        warn!("Could not cache font at {}: {}", cached.display(), e);
    }

    FontVec::try_from_vec(bytes).map_err(|_| anyhow!("downloaded font is not a valid TTF"))
}

fn read_font(path: &Path) -> Result<FontVec> {
    let bytes = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|_| anyhow!("{} is not a valid font", path.display()))
}

fn download(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("read font download")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty response from {}", url));
    }
    Ok(bytes)
}
