use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "2023-05-15";

const DEFAULT_CONFIG_SOURCE: &str = "file";
const DEFAULT_RESOURCE_DIR: &str = ".";
const CONFIG_FILE_NAME: &str = "azchat.json";
const DEV_CONFIG_FILE_NAME: &str = "azchat.dev.json";

const DEFAULT_HISTORY_LENGTH: usize = 10;
const DEFAULT_MAX_TOKENS: u32 = 150;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TOP_P: f32 = 0.95;
const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
const DEFAULT_PRESENCE_PENALTY: f32 = 0.0;

// One user/assistant pair must fit.
const MIN_HISTORY_LENGTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Env,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Env => "env",
        }
    }
}

/// Where the runtime configuration and the message templates come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupOptions {
    pub source: ConfigSource,
    pub resource_dir: PathBuf,
}

impl StartupOptions {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            source: parse_config_source(get_var("CHAT_CONFIG_SOURCE").as_deref()),
            resource_dir: parse_resource_dir(get_var("CHAT_RESOURCE_DIR").as_deref()),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_uri: String,
    pub api_key: String,
    pub deployment: String,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_uri", &self.base_uri)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub history_length: usize,
    pub generation: GenerationParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    open_ai_uri: String,
    open_ai_key: String,
    deployment: String,
    history_length: usize,
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_top_p")]
    top_p: f32,
    #[serde(default)]
    frequency_penalty: f32,
    #[serde(default)]
    presence_penalty: f32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f32 {
    DEFAULT_TOP_P
}

impl From<FileConfig> for Config {
    fn from(file: FileConfig) -> Self {
        Self {
            endpoint: EndpointConfig {
                base_uri: file.open_ai_uri,
                api_key: file.open_ai_key,
                deployment: file.deployment,
            },
            history_length: file.history_length,
            generation: GenerationParams {
                max_tokens: file.max_tokens,
                temperature: file.temperature,
                top_p: file.top_p,
                frequency_penalty: file.frequency_penalty,
                presence_penalty: file.presence_penalty,
            },
        }
    }
}

impl Config {
    pub fn load(options: &StartupOptions) -> Result<Self> {
        match options.source {
            ConfigSource::File => Self::from_dir(&options.resource_dir),
            ConfigSource::Env => Self::from_env(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let mut required = |key: &str| {
            get_var(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{} environment variable must be set", key))
        };
        let endpoint = EndpointConfig {
            base_uri: required("OPENAI_URL")?,
            api_key: required("OPENAI_KEY")?,
            deployment: required("OPENAI_DEPLOYMENT")?,
        };

        let cfg = Self {
            endpoint,
            history_length: parse_usize(
                get_var("HISTORY_LENGTH").as_deref(),
                DEFAULT_HISTORY_LENGTH,
            ),
            generation: GenerationParams {
                max_tokens: parse_positive_u32(
                    get_var("MAX_TOKENS").as_deref(),
                    DEFAULT_MAX_TOKENS,
                ),
                temperature: parse_f32(get_var("TEMPERATURE").as_deref(), DEFAULT_TEMPERATURE),
                top_p: parse_f32(get_var("TOP_P").as_deref(), DEFAULT_TOP_P),
                frequency_penalty: parse_f32(
                    get_var("FREQUENCY_PENALTY").as_deref(),
                    DEFAULT_FREQUENCY_PENALTY,
                ),
                presence_penalty: parse_f32(
                    get_var("PRESENCE_PENALTY").as_deref(),
                    DEFAULT_PRESENCE_PENALTY,
                ),
            },
        };
        cfg.validate()
    }

    /// Reads `azchat.dev.json` from `dir` when it exists, `azchat.json` otherwise.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = config_file_path(dir);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Could not load configuration file '{}'", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid configuration file '{}'", path.display()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: FileConfig =
            serde_json::from_str(raw).context("Failed to parse configuration JSON")?;
        Config::from(file).validate()
    }

    fn validate(self) -> Result<Self> {
        if self.endpoint.base_uri.trim().is_empty() {
            bail!("OpenAI endpoint URI must not be empty");
        }
        if self.endpoint.api_key.trim().is_empty() {
            bail!("OpenAI API key must not be empty");
        }
        if self.endpoint.deployment.trim().is_empty() {
            bail!("OpenAI deployment name must not be empty");
        }
        if self.endpoint.deployment.contains(['/', '?', '#', '\\']) {
            bail!(
                "OpenAI deployment name '{}' must not contain '/', '?', '#' or '\\'",
                self.endpoint.deployment
            );
        }
        if self.history_length < MIN_HISTORY_LENGTH {
            bail!(
                "History length must be at least {}, got {}",
                MIN_HISTORY_LENGTH,
                self.history_length
            );
        }
        if self.generation.max_tokens == 0 {
            bail!("Max tokens must be greater than zero");
        }
        Ok(self)
    }
}

pub fn config_file_path(dir: &Path) -> PathBuf {
    let dev_path = dir.join(DEV_CONFIG_FILE_NAME);
    if dev_path.is_file() {
        dev_path
    } else {
        dir.join(CONFIG_FILE_NAME)
    }
}

fn parse_config_source(raw: Option<&str>) -> ConfigSource {
    match raw
        .unwrap_or(DEFAULT_CONFIG_SOURCE)
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "env" => ConfigSource::Env,
        _ => ConfigSource::File,
    }
}

fn parse_resource_dir(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR))
}

fn parse_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_positive_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_f32(raw: Option<&str>, default: f32) -> f32 {
    raw.and_then(|value| value.trim().parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}
