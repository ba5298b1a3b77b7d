use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenv::dotenv;

use crate::error::GameError;
use crate::quiz::ladder::TEXT_TIME_LIMIT;

pub const DEFAULT_QUESTIONS_FILE: &str = "Questions.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory the question file is resolved against.
    pub data_dir: PathBuf,
    pub questions_file: PathBuf,
    /// Per-question budget of the console game, `None` when disabled.
    pub time_limit: Option<Duration>,
    /// SQLite file for the bot's dialogues; in-memory when unset.
    pub dialogue_db: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            questions_file: PathBuf::from(DEFAULT_QUESTIONS_FILE),
            time_limit: Some(TEXT_TIME_LIMIT),
            dialogue_db: None,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, GameError> {
        dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, GameError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = var("KBC_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = var("KBC_QUESTIONS_FILE") {
            config.questions_file = PathBuf::from(file);
        }
        if let Some(secs) = var("KBC_TIME_LIMIT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                GameError::InvalidConfig(format!(
                    "KBC_TIME_LIMIT_SECS must be a whole number of seconds, got \"{}\"",
                    secs
                ))
            })?;
            config.time_limit = match secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
        }
        config.dialogue_db = var("KBC_DIALOGUE_DB")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Question file location. An absolute `questions_file` wins over `data_dir`.
    pub fn questions_path(&self) -> PathBuf {
        self.data_dir.join(&self.questions_file)
    }
}
