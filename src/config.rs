//! Process configuration from the environment

use crate::script::{Payload, Script, ScriptError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_IDLE_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SWEEP_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read script {path}: {source}")]
    ReadScript {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Script(#[from] ScriptError),
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub script: Script,
    /// `SQLite` session database; `None` keeps sessions in memory
    pub db_path: Option<PathBuf>,
    pub idle_ttl: Duration,
    pub sweep_every: Duration,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from any variable source; blank values count
    /// as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the script file cannot be read or is invalid, or
    /// if a seconds value is not a positive integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut script = match get("QUIZGATE_SCRIPT") {
            Some(path) => {
                let path = PathBuf::from(path);
                let json = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::ReadScript { path, source })?;
                Script::from_json(&json)?
            }
            None => Script::default(),
        };

        if let Some(url) = get("QUIZGATE_PAYLOAD_URL") {
            script.payload = Payload::Url { url };
        } else if let Some(path) = get("QUIZGATE_PAYLOAD_PATH") {
            script.payload = Payload::File {
                path: PathBuf::from(path),
            };
        }

        if let Some(name) = get("QUIZGATE_BOT_USERNAME") {
            script.bot_username = Some(name);
        }

        Ok(Self {
            script: script.validated()?,
            db_path: get("QUIZGATE_DB_PATH").map(PathBuf::from),
            idle_ttl: seconds(
                "QUIZGATE_IDLE_TTL_SECS",
                get("QUIZGATE_IDLE_TTL_SECS"),
                DEFAULT_IDLE_TTL_SECS,
            )?,
            sweep_every: seconds(
                "QUIZGATE_SWEEP_SECS",
                get("QUIZGATE_SWEEP_SECS"),
                DEFAULT_SWEEP_SECS,
            )?,
        })
    }
}

fn seconds(var: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidSeconds { var, value }),
    }
}
