//! File I/O for native CLI

use anyhow::{anyhow, Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pagemark_core::AnnotatorConfig;
use tracing_subscriber::EnvFilter;

/// A markup document read from disk
pub struct SourceDocument {
    pub title: String,
    /// Canonical path, used as the document id in the store
    pub document_id: String,
    pub markup: String,
}

/// Load a markup file
pub fn load_file(path: &str) -> Result<SourceDocument> {
    let path = Path::new(path);
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let markup = fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read file: {}", canonical.display()))?;

    let title = canonical
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    Ok(SourceDocument {
        title,
        document_id: canonical.to_string_lossy().to_string(),
        markup,
    })
}

/// Get the ~/.pagemark directory path, creating it if needed
pub fn pagemark_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let pagemark_dir = home.join(".pagemark");

    if !pagemark_dir.exists() {
        fs::create_dir_all(&pagemark_dir)
            .with_context(|| format!("Failed to create {}", pagemark_dir.display()))?;
    }

    Ok(pagemark_dir)
}

/// Path of the annotation store file
pub fn store_path() -> Result<PathBuf> {
    Ok(pagemark_dir()?.join("annotations.json"))
}

/// Read ~/.pagemark/config.json, falling back to defaults when absent
pub fn load_config() -> Result<AnnotatorConfig> {
    let path = pagemark_dir()?.join("config.json");
    if !path.exists() {
        return Ok(AnnotatorConfig::default());
    }

    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AnnotatorConfig::from_json(&json).with_context(|| format!("Invalid config in {}", path.display()))
}

/// Send logs to ~/.pagemark/pagemark.log; the terminal belongs to the UI
pub fn init_logging() -> Result<PathBuf> {
    let log_path = pagemark_dir()?.join("pagemark.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env("PAGEMARK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

    Ok(log_path)
}
