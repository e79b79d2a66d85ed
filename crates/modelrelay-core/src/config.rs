use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::upload::RepoType;

/// Source hosting site (model pages and metadata API).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base of the public metadata API; `/models/{id}` is appended.
    pub api_base: String,
    /// Hosts whose `/models/{id}` pages are resolved through the API.
    pub page_hosts: Vec<String>,
    /// API key used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://civitai.com/api/v1".to_string(),
            page_hosts: vec!["civitai.com".to_string(), "www.civitai.com".to_string()],
            api_key: None,
        }
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("api_base", &self.api_base)
            .field("page_hosts", &self.page_hosts)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Upload target service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub endpoint: String,
    pub repo_type: RepoType,
    pub revision: String,
    /// Place uploaded files under a folder named after the model file stem.
    pub folder_per_model: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://huggingface.co".to_string(),
            repo_type: RepoType::Model,
            revision: "main".to_string(),
            folder_per_model: true,
        }
    }
}

/// Transport settings applied to every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort when the rate stays below this many bytes/sec ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirects: 10,
            user_agent: format!("modelrelay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Global configuration loaded from `~/.config/modelrelay/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Keep an existing destination file instead of downloading again.
    pub skip_existing: bool,
    /// Write metadata JSON, preview image and page HTML next to the model (cd_plus).
    pub sidecars: bool,
    pub source: SourceConfig,
    pub target: TargetConfig,
    pub http: HttpConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            skip_existing: true,
            sidecars: true,
            source: SourceConfig::default(),
            target: TargetConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("modelrelay")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RelayConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RelayConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<RelayConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: RelayConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = RelayConfig::default();
        assert!(cfg.skip_existing);
        assert!(cfg.sidecars);
        assert_eq!(cfg.source.api_base, "https://civitai.com/api/v1");
        assert_eq!(cfg.target.endpoint, "https://huggingface.co");
        assert_eq!(cfg.target.repo_type, RepoType::Model);
        assert_eq!(cfg.target.revision, "main");
        assert_eq!(cfg.http.max_redirects, 10);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = RelayConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: RelayConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.source.page_hosts, cfg.source.page_hosts);
        assert_eq!(parsed.http.user_agent, cfg.http.user_agent);
        assert!(parsed.source.api_key.is_none());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml = r#"
            sidecars = false

            [source]
            api_key = "abc"

            [target]
            repo_type = "dataset"
        "#;
        let cfg: RelayConfig = toml::from_str(toml).unwrap();
        assert!(!cfg.sidecars);
        assert!(cfg.skip_existing);
        assert_eq!(cfg.source.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.source.api_base, "https://civitai.com/api/v1");
        assert_eq!(cfg.target.repo_type, RepoType::Dataset);
        assert_eq!(cfg.target.revision, "main");
        assert_eq!(cfg.http.connect_timeout_secs, 30);
    }

    #[test]
    fn load_from_path_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "skip_existing = \"maybe\"").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let source = SourceConfig {
            api_key: Some("civ_secret".to_string()),
            ..SourceConfig::default()
        };
        let shown = format!("{:?}", source);
        assert!(!shown.contains("civ_secret"));
        assert!(shown.contains("[REDACTED]"));
    }
}
