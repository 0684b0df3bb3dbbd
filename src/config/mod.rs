//! Configuration management for `mdcms.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                          |
//! |------------|--------------------------------------------------|
//! | `[api]`    | CMS base url, login/token routes, session file   |
//! | `[editor]` | Auto-save delay                                  |
//! | `[alert]`  | Notification dismiss delay                       |
//!
//! # Example
//!
//! ```toml
//! [api]
//! base_url = "https://cms.example.com"
//! login_path = "/admin/login"
//! token_path = "/api/token"
//! token_file = ".mdcms/session.json"
//!
//! [editor]
//! autosave_delay_ms = 3000
//!
//! [alert]
//! dismiss_ms = 5000
//! ```

mod error;
mod util;

pub use error::ConfigError;
use util::find_config_file;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::alert::DEFAULT_DISMISS_AFTER;
use crate::api::{DEFAULT_LOGIN_PATH, DEFAULT_TOKEN_PATH};
use crate::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::log;

/// Default config file name.
pub const CONFIG_FILE: &str = "mdcms.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing mdcms.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub alert: AlertConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Site root; relative request urls resolve against it.
    pub base_url: Url,
    /// Where an expired session is sent.
    pub login_path: String,
    /// OAuth2 password-flow token endpoint.
    pub token_path: String,
    /// Session storage file (relative to the config directory).
    pub token_file: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8000").expect("valid default url"),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            token_path: DEFAULT_TOKEN_PATH.to_owned(),
            token_file: PathBuf::from(".mdcms/session.json"),
        }
    }
}

/// `[editor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub autosave_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY.as_millis() as u64,
        }
    }
}

impl EditorConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

/// `[alert]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub dismiss_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            dismiss_ms: DEFAULT_DISMISS_AFTER.as_millis() as u64,
        }
    }
}

impl AlertConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_ms)
    }
}

impl AdminConfig {
    /// Load configuration, searching upward from `start` for `config_name`.
    ///
    /// A missing file is not an error: defaults apply, rooted at `start`.
    pub fn load(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(start, config_name) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                config
            }
            None => Self {
                root: start.to_path_buf(),
                ..Self::default()
            },
        };

        config.validate()?;
        config.api.token_file = config.root.join(&config.api.token_file);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(Self::parse_with_ignored(content)?.0)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {} ignored: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if !matches!(self.api.base_url.scheme(), "http" | "https") {
            problems.push(format!(
                "api.base_url must be an http(s) url, got `{}`",
                self.api.base_url
            ));
        }
        for (field, path) in [
            ("api.login_path", &self.api.login_path),
            ("api.token_path", &self.api.token_path),
        ] {
            if !path.starts_with('/') {
                problems.push(format!("{field} must start with `/`, got `{path}`"));
            }
        }
        if self.editor.autosave_delay_ms == 0 {
            problems.push("editor.autosave_delay_ms must be greater than 0".to_owned());
        }
        if self.alert.dismiss_ms == 0 {
            problems.push("alert.dismiss_ms must be greater than 0".to_owned());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }
}

// ============================================================================
// tests
// ============================================================================
