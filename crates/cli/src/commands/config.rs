use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use shopdesk_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use toml::Value;

struct Field {
    key: &'static str,
    env_key: &'static str,
    flag: Option<&'static str>,
    value: String,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            &field,
            options,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }
    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let api_keys = if config.llm.api_keys.is_empty() {
        "<unset>".to_string()
    } else {
        let redacted = config
            .llm
            .api_keys
            .iter()
            .map(|key| redact_token(key.expose_secret()))
            .collect::<Vec<_>>();
        format!("[{}]", redacted.join(", "))
    };

    vec![
        Field {
            key: "data.dir",
            env_key: "SHOPDESK_DATA_DIR",
            flag: Some("--data-dir"),
            value: config.data.dir.display().to_string(),
        },
        Field {
            key: "data.action_log_path",
            env_key: "SHOPDESK_DATA_ACTION_LOG_PATH",
            flag: None,
            value: config.data.action_log_path.display().to_string(),
        },
        Field {
            key: "llm.api_keys",
            env_key: "SHOPDESK_LLM_API_KEYS",
            flag: None,
            value: api_keys,
        },
        Field {
            key: "llm.base_url",
            env_key: "SHOPDESK_LLM_BASE_URL",
            flag: None,
            value: config.llm.base_url.clone(),
        },
        Field {
            key: "llm.chat_model",
            env_key: "SHOPDESK_LLM_CHAT_MODEL",
            flag: None,
            value: config.llm.chat_model.clone(),
        },
        Field {
            key: "llm.router_model",
            env_key: "SHOPDESK_LLM_ROUTER_MODEL",
            flag: None,
            value: config.llm.router_model.clone(),
        },
        Field {
            key: "llm.timeout_secs",
            env_key: "SHOPDESK_LLM_TIMEOUT_SECS",
            flag: None,
            value: config.llm.timeout_secs.to_string(),
        },
        Field {
            key: "llm.retries_per_key",
            env_key: "SHOPDESK_LLM_RETRIES_PER_KEY",
            flag: None,
            value: config.llm.retries_per_key.to_string(),
        },
        Field {
            key: "llm.chat_temperature",
            env_key: "SHOPDESK_LLM_CHAT_TEMPERATURE",
            flag: None,
            value: config.llm.chat_temperature.to_string(),
        },
        Field {
            key: "llm.router_temperature",
            env_key: "SHOPDESK_LLM_ROUTER_TEMPERATURE",
            flag: None,
            value: config.llm.router_temperature.to_string(),
        },
        Field {
            key: "session.customer_id",
            env_key: "SHOPDESK_SESSION_CUSTOMER_ID",
            flag: Some("--customer-id"),
            value: config.customer_id().unwrap_or("<unset>").to_string(),
        },
        Field {
            key: "session.max_history_tokens",
            env_key: "SHOPDESK_SESSION_MAX_HISTORY_TOKENS",
            flag: None,
            value: config.session.max_history_tokens.to_string(),
        },
        Field {
            key: "session.require_confirmation",
            env_key: "SHOPDESK_SESSION_REQUIRE_CONFIRMATION",
            flag: Some("--no-confirmation"),
            value: config.session.require_confirmation.to_string(),
        },
        Field {
            key: "logging.level",
            env_key: "SHOPDESK_LOGGING_LEVEL",
            flag: None,
            value: config.logging.level.clone(),
        },
        Field {
            key: "logging.format",
            env_key: "SHOPDESK_LOGGING_FORMAT",
            flag: None,
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn flag_is_set(flag: &str, options: &LoadOptions) -> bool {
    let overrides = &options.overrides;
    match flag {
        "--data-dir" => overrides.data_dir.is_some(),
        "--customer-id" => overrides.customer_id.is_some(),
        "--no-confirmation" => overrides.require_confirmation.is_some(),
        _ => false,
    }
}

fn field_source(
    field: &Field,
    options: &LoadOptions,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag) = field.flag.filter(|flag| flag_is_set(flag, options)) {
        return format!("flag ({flag})");
    }

    if env::var_os(field.env_key).is_some() {
        return format!("env ({})", field.env_key);
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a recognisable `sk-` style prefix and nothing else.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
