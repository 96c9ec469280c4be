//! # Configuration
//!
//! `AppConfig` is built once in `main` and threaded explicitly through every
//! command. Layers, lowest precedence first: built-in defaults, the optional
//! `config.yaml`, then `.env` and the process environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::paths;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// LLM provider selection and credentials.
#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ollama_api_base")]
    pub ollama_api_base: String,
    /// Overrides the provider's default base URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            ollama_api_base: default_ollama_api_base(),
            endpoint: None,
            temperature: default_temperature(),
            timeout: default_llm_timeout(),
            retries: default_retries(),
            openai_api_key: None,
            anthropic_api_key: None,
            gemini_api_key: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "paths::default_app_support_dir")]
    pub app_support_dir: PathBuf,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            app_support_dir: paths::default_app_support_dir(),
            log_file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommandsConfig {
    /// Seconds an external tool or generated command may run.
    #[serde(default = "default_command_timeout")]
    pub timeout: u64,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            timeout: default_command_timeout(),
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}
fn default_model() -> String {
    "qwen3:4b".to_string()
}
fn default_ollama_api_base() -> String {
    "http://localhost:11434".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_retries() -> u32 {
    2
}
fn default_command_timeout() -> u64 {
    300
}

impl AppConfig {
    /// Loads every layer. `explicit` is the `--config` flag; without it the
    /// file under the app support directory is used when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // .env is optional
        let _ = dotenvy::dotenv();
        let env: Vec<(String, String)> = std::env::vars().collect();

        let home = env
            .iter()
            .find(|(key, _)| key == "ALFRED_HOME")
            .map(|(_, value)| PathBuf::from(value));

        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let dir = home.clone().unwrap_or_else(paths::default_app_support_dir);
                let candidate = paths::config_file(&dir);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match file {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_env(env);
        tracing::debug!(provider = %config.ai.provider, model = %config.ai.model, "Configuration loaded");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlays recognised environment variables. Unknown keys and unparsable
    /// numbers are ignored.
    pub fn apply_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                "AI_PROVIDER" => self.ai.provider = value.to_lowercase(),
                "AI_MODEL" => self.ai.model = value,
                "OLLAMA_API_BASE" => self.ai.ollama_api_base = value,
                "TEMPERATURE" => match value.trim().parse() {
                    Ok(temperature) => self.ai.temperature = temperature,
                    Err(_) => tracing::warn!("Ignoring TEMPERATURE={value}: not a number"),
                },
                "OPENAI_API_KEY" => self.ai.openai_api_key = Some(value),
                "ANTHROPIC_API_KEY" => self.ai.anthropic_api_key = Some(value),
                "GEMINI_API_KEY" | "GOOGLE_API_KEY" => self.ai.gemini_api_key = Some(value),
                "ALFRED_LOG_FILE" => self.paths.log_file = Some(PathBuf::from(value)),
                "ALFRED_HOME" => self.paths.app_support_dir = PathBuf::from(value),
                _ => {}
            }
        }
    }

    pub fn local_bin_dir(&self) -> PathBuf {
        paths::local_bin_dir(&self.paths.app_support_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.paths
            .log_file
            .clone()
            .unwrap_or_else(|| paths::log_file(&self.paths.app_support_dir))
    }
}
