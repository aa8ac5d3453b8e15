use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Name of the environment variable holding the API key. The key itself never lives in
    /// the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,
    #[serde(default = "default_style_hint")]
    pub style_hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            top_k: default_top_k(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            style_hint: default_style_hint(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, AppError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(AppError::new("CONFIG_INVALID", "Provider API key is not set")
                .with_details(format!("env={}", self.api_key_env))),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("app/examples.json")
}

fn default_top_k() -> u32 {
    8
}

fn default_max_tool_rounds() -> u32 {
    8
}

fn default_style_hint() -> String {
    "Fun Notes".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./outputs/Notes_formatted_summary.html")
}

pub fn load(path: &Path) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    parse(&raw).map_err(|e| {
        let details = match &e.details {
            Some(d) => format!("path={}; {d}", path.display()),
            None => format!("path={}", path.display()),
        };
        e.with_details(details)
    })
}

pub fn parse(raw: &str) -> Result<Config, AppError> {
    let mut cfg: Config = toml::from_str(raw).map_err(|e| {
        AppError::new("CONFIG_INVALID", "Failed to parse config").with_details(e.to_string())
    })?;
    normalize(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}

fn normalize(cfg: &mut Config) {
    cfg.provider.api_base = cfg.provider.api_base.trim().trim_end_matches('/').to_string();
    cfg.provider.chat_model = cfg.provider.chat_model.trim().to_string();
    cfg.provider.embedding_model = cfg.provider.embedding_model.trim().to_string();
    cfg.service.log_level = cfg.service.log_level.trim().to_lowercase();
}

pub fn validate(cfg: &Config) -> Result<(), AppError> {
    let invalid = |message: &str| AppError::new("CONFIG_INVALID", message.to_string());

    if !matches!(
        cfg.service.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid("service.log_level must be one of trace, debug, info, warn, error.")
            .with_details(format!("log_level={}", cfg.service.log_level)));
    }
    if cfg.provider.chat_model.is_empty() {
        return Err(invalid("provider.chat_model must be non-empty."));
    }
    if cfg.provider.embedding_model.is_empty() {
        return Err(invalid("provider.embedding_model must be non-empty."));
    }
    if cfg.provider.api_key_env.trim().is_empty() {
        return Err(invalid("provider.api_key_env must be non-empty."));
    }
    if cfg.provider.timeout_ms == 0 {
        return Err(invalid("provider.timeout_ms must be greater than zero."));
    }
    if !is_allowed_api_base(&cfg.provider.api_base) {
        return Err(
            invalid("provider.api_base must use https:// or http://127.0.0.1.")
                .with_details(format!("api_base={}", cfg.provider.api_base)),
        );
    }
    if cfg.corpus.top_k == 0 {
        return Err(invalid("corpus.top_k must be greater than zero."));
    }
    if cfg.corpus.manifest_path.as_os_str().is_empty() {
        return Err(invalid("corpus.manifest_path must be non-empty."));
    }
    if cfg.agent.max_tool_rounds == 0 {
        return Err(invalid("agent.max_tool_rounds must be greater than zero."));
    }
    if cfg.retry.max_attempts == 0 || cfg.retry.max_attempts > 10 {
        return Err(invalid("retry.max_attempts must be between 1 and 10."));
    }
    if cfg.retry.base_delay_ms > cfg.retry.max_delay_ms {
        return Err(invalid("retry.base_delay_ms must not exceed retry.max_delay_ms."));
    }
    if cfg.output.path.as_os_str().is_empty() {
        return Err(invalid("output.path must be non-empty."));
    }
    Ok(())
}

/// Remote providers must use TLS; plain http is only allowed against a loopback server.
pub fn is_allowed_api_base(api_base: &str) -> bool {
    let base = api_base.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        let host = rest.split('/').next().unwrap_or("");
        return !host.is_empty() && !host.contains('@');
    }
    let Some(rest) = base.strip_prefix("http://127.0.0.1") else {
        return false;
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (port_part, _path) = rest.split_at(authority_end);
    if port_part.is_empty() {
        return true;
    }
    let Some(port) = port_part.strip_prefix(':') else {
        return false;
    };
    matches!(port.parse::<u16>(), Ok(p) if p != 0)
}
