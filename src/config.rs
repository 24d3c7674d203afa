use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

const ENV_API_URL: &str = "MARKETCHAT_API_URL";
const ENV_SOCKET_URL: &str = "MARKETCHAT_SOCKET_URL";
const ENV_TOKEN: &str = "MARKETCHAT_TOKEN";

/// Connection settings for the chat subsystem, persisted as TOML in the
/// platform config directory. Environment variables override the file so
/// deployments can point at a different backend without touching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub api_url: String,
    pub socket_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub support: SupportContact,
}

/// Display identity shown in place of the raw record for the platform
/// support account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportContact {
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_support_label")]
    pub label: String,
    #[serde(default = "default_support_avatar")]
    pub avatar: String,
}

impl Default for SupportContact {
    fn default() -> Self {
        Self {
            email: String::new(),
            label: default_support_label(),
            avatar: default_support_avatar(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            socket_url: String::new(),
            token: None,
            request_timeout_secs: default_timeout_secs(),
            support: SupportContact::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_support_label() -> String {
    "Admin".to_string()
}

fn default_support_avatar() -> String {
    "/assets/admin-avatar.png".to_string()
}

impl ChatConfig {
    fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("marketchat.toml"))
    }

    /// Load from the config file, then apply environment overrides. Falls
    /// back to defaults when no file exists or it fails to parse.
    pub fn load() -> Self {
        let mut config = Self::from_file().unwrap_or_default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var(ENV_SOCKET_URL) {
            config.socket_url = url;
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }
        config.api_url = normalize_url(&config.api_url);
        config
    }

    fn from_file() -> Option<Self> {
        let path = Self::toml_path()?;
        let text = fs::read_to_string(&path).ok()?;
        toml::from_str(&text).ok()
    }

    pub fn save(&self) -> Result<()> {
        let path =
            Self::toml_path().ok_or_else(|| ChatError::Config("no config directory".into()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self).map_err(|e| ChatError::Config(e.to_string()))?;
        fs::write(path, toml)?;
        Ok(())
    }
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme_when_missing() {
        assert_eq!(normalize_url("api.example.com"), "https://api.example.com");
        assert_eq!(normalize_url("http://api.example.com"), "http://api.example.com");
        assert_eq!(normalize_url("  ws://api.example.com  "), "ws://api.example.com");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ChatConfig {
            api_url: "https://api.example.com".into(),
            socket_url: "ws://api.example.com/live".into(),
            token: Some("tok".into()),
            request_timeout_secs: 5,
            support: SupportContact {
                email: "support@example.com".into(),
                ..SupportContact::default()
            },
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ChatConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.api_url, config.api_url);
        assert_eq!(parsed.token.as_deref(), Some("tok"));
        assert_eq!(parsed.support.email, "support@example.com");
        assert_eq!(parsed.support.label, "Admin");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: ChatConfig =
            toml::from_str("api_url = \"https://api.example.com\"\nsocket_url = \"ws://x\"\n")
                .unwrap();
        assert_eq!(parsed.request_timeout_secs, 10);
        assert!(parsed.token.is_none());
        assert_eq!(parsed.support.label, "Admin");
    }
}
