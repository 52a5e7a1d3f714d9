//! Configuration: TOML file plus environment overrides.

use crate::error::{Result, StudioError};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "LOOKSTUDIO_CONFIG_PATH";
const ENV_LISTEN_ADDR: &str = "LOOKSTUDIO_LISTEN_ADDR";
const ENV_UPSTREAM_URL: &str = "LOOKSTUDIO_UPSTREAM_URL";
const ENV_API_KEY: &str = "GEMINI_API_KEY";
const ENV_ADMIN_ID: &str = "LOOKSTUDIO_ADMIN_ID";
const ENV_ADMIN_PASSWORD: &str = "LOOKSTUDIO_ADMIN_PASSWORD";
const ENV_STATE_DIR: &str = "LOOKSTUDIO_STATE_DIR";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    listen_addr: String,
    upstream_url: String,
    api_key: Option<String>,
    admin_id: Option<String>,
    admin_password: Option<String>,
    state_dir: PathBuf,
}

impl StudioConfig {
    /// Loads configuration from the config file (if present) and applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        let path = match config_file_override() {
            Some(path) => path,
            None => Self::default_config_path()?,
        };
        if path.exists() {
            config.apply_partial(read_partial(&path)?);
        }

        config.apply_env();
        Ok(config)
    }

    /// Address the relay server binds to.
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Base URL of the upstream generation service.
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// The server-held API key, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The server-held API key, or a configuration error naming the env var.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| StudioError::Config(format!("{ENV_API_KEY} is not set")))
    }

    /// Admin login pair from configuration, if both halves are present.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_id.as_deref(), self.admin_password.as_deref()) {
            (Some(id), Some(password)) => Some((id, password)),
            _ => None,
        }
    }

    /// Directory holding the persisted auth flag.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Default config file path under the platform config directory.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(addr) = partial.listen_addr {
            self.listen_addr = addr;
        }
        if let Some(url) = partial.upstream_url {
            self.upstream_url = url;
        }
        if let Some(key) = partial.api_key {
            self.api_key = Some(key);
        }
        if let Some(id) = partial.admin_id {
            self.admin_id = Some(id);
        }
        if let Some(password) = partial.admin_password {
            self.admin_password = Some(password);
        }
        if let Some(dir) = partial.state_dir {
            self.state_dir = dir;
        }
    }

    fn apply_env(&mut self) {
        if let Some(value) = non_empty_env(ENV_LISTEN_ADDR) {
            self.listen_addr = value;
        }
        if let Some(value) = non_empty_env(ENV_UPSTREAM_URL) {
            self.upstream_url = value;
        }
        if let Some(value) = non_empty_env(ENV_API_KEY) {
            self.api_key = Some(value);
        }
        if let Some(value) = non_empty_env(ENV_ADMIN_ID) {
            self.admin_id = Some(value);
        }
        if let Some(value) = non_empty_env(ENV_ADMIN_PASSWORD) {
            self.admin_password = Some(value);
        }
        if let Some(value) = non_empty_env(ENV_STATE_DIR) {
            self.state_dir = PathBuf::from(value);
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            api_key: None,
            admin_id: None,
            admin_password: None,
            state_dir: default_state_dir(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "LookStudio", "LookStudio")
        .ok_or_else(|| StudioError::Config("unable to determine config directory".into()))
}

fn default_state_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|_| PathBuf::from("./state"))
}

fn config_file_override() -> Option<PathBuf> {
    env::var_os(ENV_CONFIG_PATH)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| {
        StudioError::Config(format!("failed to parse {}: {e}", path.display()))
    })
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PartialConfig {
    listen_addr: Option<String>,
    upstream_url: Option<String>,
    api_key: Option<String>,
    admin_id: Option<String>,
    admin_password: Option<String>,
    state_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.listen_addr(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.upstream_url(), DEFAULT_UPSTREAM_URL);
        assert!(config.api_key().is_none());
        assert!(config.admin_credentials().is_none());
    }

    #[test]
    fn test_partial_file_applies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
listen_addr = "0.0.0.0:9000"
api_key = "file-key"
admin_id = "admin"
admin_password = "s3cret"
"#,
        )
        .unwrap();

        let mut config = StudioConfig::default();
        config.apply_partial(read_partial(&path).unwrap());

        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
        assert_eq!(config.require_api_key().unwrap(), "file-key");
        assert_eq!(config.admin_credentials(), Some(("admin", "s3cret")));
        // Untouched fields keep their defaults.
        assert_eq!(config.upstream_url(), DEFAULT_UPSTREAM_URL);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "listen_addr = [").unwrap();
        assert!(matches!(
            read_partial(&path),
            Err(StudioError::Config(_))
        ));
    }

    #[test]
    fn test_missing_key_named_in_error() {
        let config = StudioConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
