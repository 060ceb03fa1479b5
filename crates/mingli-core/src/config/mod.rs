use crate::error::{MingliError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "MINGLI_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MingliConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Unset means requests may hang indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Where the logged-in user is persisted. Defaults to
    /// `~/.config/mingli/current_user.json`.
    #[serde(default)]
    pub session_path: Option<String>,
}

/// Identity used by the stand-in login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_nickname")]
    pub nickname: String,
    #[serde(default = "default_avatar_url")]
    pub avatar_url: Option<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            nickname: default_nickname(),
            avatar_url: default_avatar_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Event poll interval of the terminal UI.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// How many ticks a notice stays on screen.
    #[serde(default = "default_notice_ticks")]
    pub notice_ticks: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            notice_ticks: default_notice_ticks(),
        }
    }
}

// -- Defaults --

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_nickname() -> String {
    "测试用户".to_string()
}
fn default_avatar_url() -> Option<String> {
    Some("https://via.placeholder.com/150".to_string())
}
fn default_tick_ms() -> u64 {
    50
}
fn default_notice_ticks() -> u16 {
    40
}

impl MingliConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/mingli/config.toml (global)
    /// 2. .mingli/config.toml (project)
    /// 3. .mingli/config.local.toml (local, gitignored)
    ///
    /// `MINGLI_API_URL` wins over all files.
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Layer 1: Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        // Layer 2: Project config
        if let Some(dir) = project_dir {
            let project_config = dir.join(".mingli").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            // Layer 3: Local config (gitignored)
            let local_config = dir.join(".mingli").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MINGLI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| MingliError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| MingliError::Config(e.to_string()))?;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                cfg.api.base_url = url;
            }
        }

        cfg.validate();
        Ok(cfg)
    }

    /// Load with defaults only (no files).
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            login: LoginConfig::default(),
            ui: UiConfig::default(),
        }
    }

    /// Validate config values, fixing out-of-range values and logging warnings.
    /// This is lenient: it repairs values rather than rejecting the config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        let trimmed = self.api.base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            warnings.push(format!(
                "api.base_url '{}' is not an http(s) URL, using {}",
                self.api.base_url,
                default_base_url()
            ));
            self.api.base_url = default_base_url();
        } else {
            self.api.base_url = trimmed;
        }

        if self.api.request_timeout_secs == Some(0) {
            warnings.push("api.request_timeout_secs = 0, disabling the timeout".to_string());
            self.api.request_timeout_secs = None;
        }

        if self.login.nickname.trim().is_empty() {
            warnings.push(format!(
                "login.nickname is empty, using '{}'",
                default_nickname()
            ));
            self.login.nickname = default_nickname();
        }

        if self.ui.tick_ms == 0 {
            warnings.push("ui.tick_ms = 0, setting to 10".to_string());
            self.ui.tick_ms = 10;
        }
        if self.ui.notice_ticks == 0 {
            warnings.push("ui.notice_ticks = 0, setting to 1".to_string());
            self.ui.notice_ticks = 1;
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }

    /// Resolved path of the persisted-user file.
    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.storage.session_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => config_dir()
                .map(|p| p.join("current_user.json"))
                .ok_or_else(|| MingliError::Config("cannot determine config directory".into())),
        }
    }
}

/// `~/.config/mingli`
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mingli"))
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}
