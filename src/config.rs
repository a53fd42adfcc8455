use std::env;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config_io::{app_dir, merge_toml_text, read_text_file, write_text_file_atomic};

pub const DEFAULT_CONFIG_TOML: &str = r#"[ai]
api_key = ""
model = "gpt-4o-mini"
base_url = "https://api.openai.com/v1"
proxy = ""
temperature = 0.2
max_tokens = 1000

[user]
default_prompt_mode = "exec"
preferences = ""

[system]
editor = ""
"#;

const CONFIG_FILE_NAME: &str = "config.toml";
const FALLBACK_EDITOR: &str = "nano";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to access configuration at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("cannot locate configuration directory: {0}")]
    Home(#[source] io::Error),
}

impl ConfigError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    #[serde(default)]
    pub proxy: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub default_prompt_mode: String,
    #[serde(default)]
    pub preferences: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SystemConfigFile {
    #[serde(default)]
    editor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ConfigFile {
    ai: AiConfig,
    user: UserConfig,
    system: SystemConfigFile,
}

/// Facts about the host the prompts and the settings editor depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    pub editor: String,
    pub config_file: PathBuf,
    pub os_name: String,
    pub shell: String,
    pub home_dir: String,
    pub username: String,
}

impl SystemConfig {
    fn detect(configured_editor: &str, config_file: &Path) -> Self {
        let editor = Some(configured_editor.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| env_value("EDITOR"))
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string());
        let shell = env_value("SHELL")
            .and_then(|value| {
                Path::new(&value)
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| "bash".to_string());
        Self {
            editor,
            config_file: config_file.to_path_buf(),
            os_name: env::consts::OS.to_string(),
            shell,
            home_dir: env_value("HOME").unwrap_or_default(),
            username: env_value("USER")
                .or_else(|| env_value("USERNAME"))
                .unwrap_or_default(),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ai: AiConfig,
    pub user: UserConfig,
    pub system: SystemConfig,
}

impl Config {
    fn from_file(file: ConfigFile, path: &Path) -> Self {
        let system = SystemConfig::detect(&file.system.editor, path);
        Self {
            ai: file.ai,
            user: file.user,
            system,
        }
    }
}

/// Where the config lives and how it is read and written.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn from_home() -> Result<Self, ConfigError> {
        let dir = app_dir().map_err(ConfigError::Home)?;
        Ok(Self::at(dir.join(CONFIG_FILE_NAME)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let text = match read_text_file(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        self.parse(&text)
    }

    /// Persists the bootstrap answer on top of the shipped defaults and
    /// returns the resulting config.
    pub fn write_api_key(&self, api_key: &str) -> Result<Config, ConfigError> {
        let existing = match read_text_file(&self.path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let mut merged = merge_toml_text(DEFAULT_CONFIG_TOML, existing.as_deref())
            .map_err(|source| self.io_error(source))?;
        if let Some(ai) = merged.get_mut("ai").and_then(toml::Value::as_table_mut) {
            ai.insert(
                "api_key".to_string(),
                toml::Value::String(api_key.trim().to_string()),
            );
        }
        let text = toml::to_string_pretty(&merged)?;
        write_text_file_atomic(&self.path, &text).map_err(|source| self.io_error(source))?;
        self.parse(&text)
    }

    fn parse(&self, text: &str) -> Result<Config, ConfigError> {
        toml::from_str::<toml::Value>(text).map_err(|source| self.parse_error(source))?;
        let merged = merge_toml_text(DEFAULT_CONFIG_TOML, Some(text))
            .map_err(|source| self.io_error(source))?;
        let file = merged
            .try_into::<ConfigFile>()
            .map_err(|source| self.parse_error(source))?;
        Ok(Config::from_file(file, &self.path))
    }

    fn parse_error(&self, source: toml::de::Error) -> ConfigError {
        ConfigError::Parse {
            path: self.path.clone(),
            source,
        }
    }

    fn io_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config_tests.rs"]
mod tests;
