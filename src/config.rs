use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Optional `config.toml` contents.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    session_file: Option<PathBuf>,
    capitalize_names: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub session_file: PathBuf,
    pub capitalize_names: bool,
}

pub fn data_dir() -> PathBuf {
    let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home_dir).join(".todo-client")
}

/// Where TUI sessions write their log, so it doesn't draw over the screen.
pub fn log_file() -> PathBuf {
    data_dir().join("todo-client.log")
}

impl Config {
    /// Flag > environment > config file > default.
    pub fn load(base_url_flag: Option<&str>, config_path: Option<&Path>) -> Result<Self> {
        let dir = data_dir();
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join("config.toml"));
        let file = read_file_config(&config_path)?;

        let base_url = base_url_flag
            .map(str::to_string)
            .or_else(|| std::env::var("TODO_API_BASE_URL").ok())
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let session_file = std::env::var("TODO_SESSION_FILE")
            .ok()
            .map(PathBuf::from)
            .or(file.session_file)
            .unwrap_or_else(|| dir.join("session"));

        let config = Config {
            base_url: validate_base_url(&base_url)?,
            session_file,
            capitalize_names: file.capitalize_names.unwrap_or(true),
        };
        log::debug!("Using config: {:?}", config);
        Ok(config)
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

fn validate_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).with_context(|| format!("Invalid base URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("Base URL must use http or https: {}", raw);
    }
    Ok(raw.trim_end_matches('/').to_string())
}
