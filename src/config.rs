// src/config.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Bind host (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Ordered list of channel identifiers to relay
    #[serde(default)]
    pub blogs: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            blogs: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Apply environment overrides: BLOG_LIST replaces the blog list,
    /// PORT replaces the port. Unset or unparsable values are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(list) = std::env::var("BLOG_LIST") {
            self.blogs = parse_blog_list(&list);
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
    }
}

/// Split a comma-separated blog list, trimming entries and dropping empties.
pub fn parse_blog_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect()
}

/// Provider credentials: four opaque secrets passed through to the
/// provider client. Missing variables become empty strings; validity is
/// the provider's concern.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            consumer_key: env_secret("TUMBLR_CONSUMER_KEY"),
            consumer_secret: env_secret("TUMBLR_CONSUMER_SECRET"),
            token: env_secret("TUMBLR_TOKEN"),
            token_secret: env_secret("TUMBLR_TOKEN_SECRET"),
        }
    }
}

fn env_secret(key: &str) -> String {
    std::env::var(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("phazr.toml")
}

pub fn load_config(path: &Path) -> Result<Option<RelayConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &RelayConfig) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    std::fs::write(path, toml)?;
    Ok(())
}
