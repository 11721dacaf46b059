use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::is_customer_id;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["shopdesk.toml", "config/shopdesk.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data: DataConfig,
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub action_log_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_keys: Vec<SecretString>,
    pub base_url: String,
    pub chat_model: String,
    pub router_model: String,
    pub timeout_secs: u64,
    pub retries_per_key: u32,
    pub chat_temperature: f32,
    pub router_temperature: f32,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub customer_id: Option<String>,
    pub max_history_tokens: usize,
    pub require_confirmation: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub action_log_path: Option<PathBuf>,
    pub customer_id: Option<String>,
    pub chat_model: Option<String>,
    pub router_model: Option<String>,
    pub log_level: Option<String>,
    pub require_confirmation: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                dir: PathBuf::from("data"),
                action_log_path: PathBuf::from("data/action_log.jsonl"),
            },
            llm: LlmConfig {
                api_keys: Vec::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                chat_model: "gpt-4o-mini".to_string(),
                router_model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
                retries_per_key: 2,
                chat_temperature: 0.2,
                router_temperature: 0.0,
            },
            session: SessionConfig {
                customer_id: None,
                max_history_tokens: 1500,
                require_confirmation: true,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

/// Splits a comma separated key list, dropping blanks.
fn secret_list(raw: &str) -> Vec<SecretString> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| secret_value(key.to_string()))
        .collect()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.session.customer_id.as_deref()
    }

    /// Chat needs a model endpoint; search and tool commands do not.
    pub fn require_llm_credentials(&self) -> Result<(), ConfigError> {
        let has_key = self.llm.api_keys.iter().any(|key| !key.expose_secret().trim().is_empty());
        if !has_key {
            return Err(ConfigError::Validation(
                "llm.api_keys needs at least one key (set SHOPDESK_LLM_API_KEYS)".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(data) = patch.data {
            if let Some(dir) = data.dir {
                self.data.dir = dir;
            }
            if let Some(action_log_path) = data.action_log_path {
                self.data.action_log_path = action_log_path;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_keys) = llm.api_keys {
                self.llm.api_keys = api_keys.into_iter().map(secret_value).collect();
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(chat_model) = llm.chat_model {
                self.llm.chat_model = chat_model;
            }
            if let Some(router_model) = llm.router_model {
                self.llm.router_model = router_model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(retries_per_key) = llm.retries_per_key {
                self.llm.retries_per_key = retries_per_key;
            }
            if let Some(chat_temperature) = llm.chat_temperature {
                self.llm.chat_temperature = chat_temperature;
            }
            if let Some(router_temperature) = llm.router_temperature {
                self.llm.router_temperature = router_temperature;
            }
        }

        if let Some(session) = patch.session {
            if let Some(customer_id) = session.customer_id {
                self.session.customer_id = Some(customer_id);
            }
            if let Some(max_history_tokens) = session.max_history_tokens {
                self.session.max_history_tokens = max_history_tokens;
            }
            if let Some(require_confirmation) = session.require_confirmation {
                self.session.require_confirmation = require_confirmation;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOPDESK_DATA_DIR") {
            self.data.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SHOPDESK_DATA_ACTION_LOG_PATH") {
            self.data.action_log_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("SHOPDESK_LLM_API_KEYS") {
            self.llm.api_keys = secret_list(&value);
        }
        if let Some(value) = read_env("SHOPDESK_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_CHAT_MODEL") {
            self.llm.chat_model = value;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_ROUTER_MODEL") {
            self.llm.router_model = value;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SHOPDESK_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_RETRIES_PER_KEY") {
            self.llm.retries_per_key = parse_u32("SHOPDESK_LLM_RETRIES_PER_KEY", &value)?;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_CHAT_TEMPERATURE") {
            self.llm.chat_temperature = parse_f32("SHOPDESK_LLM_CHAT_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("SHOPDESK_LLM_ROUTER_TEMPERATURE") {
            self.llm.router_temperature = parse_f32("SHOPDESK_LLM_ROUTER_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("SHOPDESK_SESSION_CUSTOMER_ID") {
            self.session.customer_id = Some(value);
        }
        if let Some(value) = read_env("SHOPDESK_SESSION_MAX_HISTORY_TOKENS") {
            self.session.max_history_tokens =
                parse_usize("SHOPDESK_SESSION_MAX_HISTORY_TOKENS", &value)?;
        }
        if let Some(value) = read_env("SHOPDESK_SESSION_REQUIRE_CONFIRMATION") {
            self.session.require_confirmation =
                parse_bool("SHOPDESK_SESSION_REQUIRE_CONFIRMATION", &value)?;
        }

        let log_level =
            read_env("SHOPDESK_LOGGING_LEVEL").or_else(|| read_env("SHOPDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOPDESK_LOGGING_FORMAT").or_else(|| read_env("SHOPDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(data_dir) = overrides.data_dir {
            self.data.dir = data_dir;
        }
        if let Some(action_log_path) = overrides.action_log_path {
            self.data.action_log_path = action_log_path;
        }
        if let Some(customer_id) = overrides.customer_id {
            self.session.customer_id = Some(customer_id);
        }
        if let Some(chat_model) = overrides.chat_model {
            self.llm.chat_model = chat_model;
        }
        if let Some(router_model) = overrides.router_model {
            self.llm.router_model = router_model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(require_confirmation) = overrides.require_confirmation {
            self.session.require_confirmation = require_confirmation;
        }
    }

    pub fn validate(&mut self) -> Result<(), ConfigError> {
        validate_data(&self.data)?;
        validate_llm(&self.llm)?;
        validate_session(&mut self.session)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    if data.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("data.dir must not be empty".to_string()));
    }
    if data.action_log_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "data.action_log_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if llm.retries_per_key == 0 {
        return Err(ConfigError::Validation(
            "llm.retries_per_key must be greater than zero".to_string(),
        ));
    }

    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    let temperatures = [
        ("llm.chat_temperature", llm.chat_temperature),
        ("llm.router_temperature", llm.router_temperature),
    ];
    for (name, value) in temperatures {
        if !(0.0..=2.0).contains(&value) {
            return Err(ConfigError::Validation(format!("{name} must be in range 0.0..=2.0")));
        }
    }

    if llm.chat_model.trim().is_empty() || llm.router_model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.chat_model and llm.router_model must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Normalises the bound customer id to upper case once it is known to be valid.
fn validate_session(session: &mut SessionConfig) -> Result<(), ConfigError> {
    if let Some(customer_id) = session.customer_id.as_mut() {
        if !is_customer_id(customer_id) {
            return Err(ConfigError::Validation(format!(
                "session.customer_id `{customer_id}` must be `C` followed by four digits"
            )));
        }
        *customer_id = customer_id.trim().to_ascii_uppercase();
    }

    if session.max_history_tokens == 0 {
        return Err(ConfigError::Validation(
            "session.max_history_tokens must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.trim().parse::<f32>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    data: Option<DataPatch>,
    llm: Option<LlmPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    dir: Option<PathBuf>,
    action_log_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_keys: Option<Vec<String>>,
    base_url: Option<String>,
    chat_model: Option<String>,
    router_model: Option<String>,
    timeout_secs: Option<u64>,
    retries_per_key: Option<u32>,
    chat_temperature: Option<f32>,
    router_temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    customer_id: Option<String>,
    max_history_tokens: Option<usize>,
    require_confirmation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
