//! Settings resolution: built-in defaults, YAML file, environment, CLI flags.
//!
//! Later layers win: CLI flag > environment variable > config file > default.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::llm::ollama::DEFAULT_HOST;
use crate::prompt::DEFAULT_MAX_CONTENT_LENGTH;

pub const DEFAULT_MODEL: &str = "gemma3:12b";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_REPEAT_PENALTY: f32 = 1.1;
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const CONFIG_DIR_NAME: &str = "committy";
const CONFIG_FILE_NAME: &str = "config.yml";

const ENV_MODEL: &str = "COMMITTY_MODEL";
const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
const ENV_TEMP: &str = "COMMITTY_TEMP";
const ENV_MAX_TOKENS: &str = "COMMITTY_MAX_TOKENS";
const ENV_TIMEOUT: &str = "COMMITTY_TIMEOUT";
const ENV_FORMAT: &str = "COMMITTY_FORMAT";
const ENV_WITH_SCOPE: &str = "COMMITTY_WITH_SCOPE";
const ENV_NO_CONFIRM: &str = "COMMITTY_NO_CONFIRM";
const ENV_EDITOR: &str = "COMMITTY_EDITOR";
const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";

/// Stop sequences sent with every request unless configured otherwise.
pub fn default_stop_sequences() -> Vec<String> {
    vec!["```".to_string(), "---".to_string()]
}

/// Commit message style.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// Conventional commits, with prompts specialised per change type.
    #[default]
    Conventional,
    /// Conventional commits from a single generic prompt.
    Simple,
}

impl FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conventional" => Ok(Self::Conventional),
            "simple" => Ok(Self::Simple),
            other => Err(format!("unknown format '{}'", other)),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub format: MessageFormat,
    pub with_scope: bool,
    pub host: String,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
    pub stop_sequences: Vec<String>,
    /// Character budget for the diff section of the prompt.
    pub max_content_length: usize,
    pub no_confirm: bool,
    /// Editor command; falls back to `$VISUAL`/`$EDITOR` when unset.
    pub editor: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            format: MessageFormat::default(),
            with_scope: true,
            host: DEFAULT_HOST.to_string(),
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            repeat_penalty: DEFAULT_REPEAT_PENALTY,
            stop_sequences: default_stop_sequences(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            no_confirm: false,
            editor: None,
        }
    }
}

/// Contents of the YAML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Seconds.
    pub timeout: Option<u64>,
    pub format: Option<MessageFormat>,
    pub with_scope: Option<bool>,
    pub host: Option<String>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub repeat_penalty: Option<f32>,
    pub stop_sequences: Option<Vec<String>>,
    pub max_content_length: Option<usize>,
    pub no_confirm: Option<bool>,
    pub editor: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub format: Option<MessageFormat>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Seconds.
    pub timeout: Option<u64>,
    pub host: Option<String>,
    pub with_scope: Option<bool>,
    pub no_confirm: Option<bool>,
}

impl Settings {
    fn apply_file(&mut self, file: FileConfig) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = file.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(secs) = file.timeout {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(format) = file.format {
            self.format = format;
        }
        if let Some(with_scope) = file.with_scope {
            self.with_scope = with_scope;
        }
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(top_p) = file.top_p {
            self.top_p = top_p;
        }
        if let Some(top_k) = file.top_k {
            self.top_k = top_k;
        }
        if let Some(repeat_penalty) = file.repeat_penalty {
            self.repeat_penalty = repeat_penalty;
        }
        if let Some(stop_sequences) = file.stop_sequences {
            self.stop_sequences = stop_sequences;
        }
        if let Some(max_content_length) = file.max_content_length {
            self.max_content_length = max_content_length;
        }
        if let Some(no_confirm) = file.no_confirm {
            self.no_confirm = no_confirm;
        }
        if let Some(editor) = file.editor {
            self.editor = Some(editor);
        }
    }

    /// Apply environment overrides. Invalid values are logged and ignored.
    fn apply_env(&mut self) {
        if let Some(model) = env_string(ENV_MODEL).or_else(|| env_string(ENV_OLLAMA_MODEL)) {
            self.model = model;
        }
        if let Some(temperature) = env_parsed::<f32>(ENV_TEMP) {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = env_parsed::<u32>(ENV_MAX_TOKENS) {
            self.max_tokens = max_tokens;
        }
        if let Some(secs) = env_parsed::<u64>(ENV_TIMEOUT) {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(format) = env_parsed::<MessageFormat>(ENV_FORMAT) {
            self.format = format;
        }
        if let Some(with_scope) = env_bool(ENV_WITH_SCOPE) {
            self.with_scope = with_scope;
        }
        if let Some(no_confirm) = env_bool(ENV_NO_CONFIRM) {
            self.no_confirm = no_confirm;
        }
        if let Some(editor) = env_string(ENV_EDITOR) {
            self.editor = Some(editor);
        }
        if let Some(host) = env_string(ENV_OLLAMA_HOST) {
            self.host = host;
        }
    }

    fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        if let Some(temperature) = cli.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = cli.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(secs) = cli.timeout {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(with_scope) = cli.with_scope {
            self.with_scope = with_scope;
        }
        if let Some(no_confirm) = cli.no_confirm {
            self.no_confirm = no_confirm;
        }
    }

    /// Reject values no backend would accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, reason: String| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason,
            })
        };

        if self.model.trim().is_empty() {
            return invalid("model", "must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature", format!("{} is outside 0.0-2.0", self.temperature));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return invalid("top_p", format!("{} is outside (0.0, 1.0]", self.top_p));
        }
        if self.repeat_penalty <= 0.0 {
            return invalid("repeat_penalty", "must be positive".to_string());
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens", "must be at least 1".to_string());
        }
        if self.timeout.is_zero() {
            return invalid("timeout", "must be at least 1 second".to_string());
        }
        if self.max_content_length == 0 {
            return invalid("max_content_length", "must be at least 1".to_string());
        }
        if self.host.trim().is_empty() {
            return invalid("host", "must not be empty".to_string());
        }
        Ok(())
    }
}

/// Resolve settings from every layer.
///
/// `config_path` overrides the default file location. A missing file is
/// not an error; an unreadable or malformed one is.
pub fn resolve(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };
    match path {
        Some(path) => match load_file(&path)? {
            Some(file) => {
                info!("Loaded configuration from {}", path.display());
                settings.apply_file(file);
            }
            None if config_path.is_some() => {
                warn!("Config file {} does not exist, using defaults", path.display());
            }
            None => debug!("No config file at {}", path.display()),
        },
        None => debug!("No config directory available"),
    }

    settings.apply_env();
    settings.apply_cli(cli);
    settings.validate()?;

    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

/// Read a config file. `Ok(None)` when it does not exist.
pub fn load_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if text.trim().is_empty() {
        return Ok(Some(FileConfig::default()));
    }

    serde_yaml::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// `$XDG_CONFIG_HOME/committy/config.yml`, else the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let base = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Commented config file holding the built-in defaults.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# committy configuration
#
# Precedence: command-line flag > environment variable > this file > built-in default.

# Ollama model used for generation (COMMITTY_MODEL / OLLAMA_MODEL)
model: gemma3:12b

# Ollama server address (OLLAMA_HOST)
host: http://localhost:11434

# Message style: conventional (prompt specialised per change type) or simple (COMMITTY_FORMAT)
format: conventional

# Ask the model for a scope and infer one from the changed paths if it is missing (COMMITTY_WITH_SCOPE)
with_scope: true

# Sampling (COMMITTY_TEMP, COMMITTY_MAX_TOKENS)
temperature: 0.2
max_tokens: 256
top_p: 0.9
top_k: 40
repeat_penalty: 1.1
stop_sequences:
  - "```"
  - "---"

# Seconds to wait for the model before giving up (COMMITTY_TIMEOUT)
timeout: 10

# Characters of diff included in the prompt; larger diffs are truncated
max_content_length: 16000

# Commit without asking for confirmation (COMMITTY_NO_CONFIRM)
no_confirm: false

# Editor for --edit; unset uses $VISUAL, then $EDITOR (COMMITTY_EDITOR)
# editor: vim
"#;

/// Write [`DEFAULT_CONFIG_TEMPLATE`] to `path`, refusing to overwrite.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }

    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
        .map_err(write_err)?;
    file.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            ConfigError::AlreadyExists(path.to_path_buf())
        } else {
            write_err(e.error)
        }
    })?;

    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn env_string(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let value = env_string(key)?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Invalid {} value '{}', ignoring it", key, value);
            None
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    let value = env_string(key)?;
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!("Invalid {} value '{}', expected true or false; ignoring it", key, value);
            None
        }
    }
}
