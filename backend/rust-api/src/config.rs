use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::quiz::QUESTIONS_PER_ATTEMPT;

/// Where content, history and progress live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// MongoDB for content, history and progress; Redis for sessions.
    Mongo,
    /// Process-local stores; content comes from `content_seed_path`.
    Memory,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageMode::Mongo),
            "memory" | "in-memory" => Ok(StorageMode::Memory),
            other => Err(format!("unknown storage mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizSettings {
    pub questions_per_attempt: usize,
    pub attempt_ttl_seconds: u64,
    pub repetition_ttl_seconds: u64,
    /// Attempts read when building the dashboard.
    pub history_limit: usize,
    /// Fixed seed for the shuffle generator; unset means OS entropy.
    pub shuffle_seed: Option<u64>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_per_attempt: QUESTIONS_PER_ATTEMPT,
            attempt_ttl_seconds: 3600,
            repetition_ttl_seconds: 30 * 24 * 3600,
            history_limit: 100,
            shuffle_seed: None,
        }
    }
}

impl QuizSettings {
    pub fn attempt_ttl(&self) -> Duration {
        Duration::from_secs(self.attempt_ttl_seconds)
    }

    pub fn repetition_ttl(&self) -> Duration {
        Duration::from_secs(self.repetition_ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage_mode: StorageMode,
    pub mongo_uri: String,
    pub redis_uri: String,
    pub mongo_database: String,
    pub content_seed_path: Option<String>,
    pub server_addr: String,
    pub quiz: QuizSettings,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the working directory
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml, then APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let storage_mode = settings
            .get_string("storage.mode")
            .or_else(|_| env::var("STORAGE_MODE"))
            .unwrap_or_else(|_| "mongo".to_string())
            .parse::<StorageMode>()
            .map_err(config::ConfigError::Message)?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .unwrap_or_else(|_| {
                let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
                let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
                match env::var("REDIS_PASSWORD") {
                    Ok(password) => format!("redis://:{}@{}:{}/0", password, host, port),
                    Err(_) => format!("redis://{}:{}/0", host, port),
                }
            });

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "mastery".to_string());

        let content_seed_path = settings
            .get_string("content.seed_path")
            .or_else(|_| env::var("CONTENT_SEED_PATH"))
            .ok();

        let server_addr = settings
            .get_string("server.addr")
            .or_else(|_| env::var("SERVER_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let defaults = QuizSettings::default();
        let quiz = QuizSettings {
            questions_per_attempt: number_setting(
                &settings,
                "quiz.questions_per_attempt",
                "QUIZ_QUESTIONS_PER_ATTEMPT",
            )?
            .map(|value| value as usize)
            .filter(|value| *value > 0)
            .unwrap_or(defaults.questions_per_attempt),
            attempt_ttl_seconds: number_setting(
                &settings,
                "quiz.attempt_ttl_seconds",
                "QUIZ_ATTEMPT_TTL_SECONDS",
            )?
            .filter(|value| *value > 0)
            .unwrap_or(defaults.attempt_ttl_seconds),
            repetition_ttl_seconds: number_setting(
                &settings,
                "quiz.repetition_ttl_seconds",
                "QUIZ_REPETITION_TTL_SECONDS",
            )?
            .filter(|value| *value > 0)
            .unwrap_or(defaults.repetition_ttl_seconds),
            history_limit: number_setting(
                &settings,
                "quiz.history_limit",
                "QUIZ_HISTORY_LIMIT",
            )?
            .map(|value| value as usize)
            .filter(|value| *value > 0)
            .unwrap_or(defaults.history_limit),
            shuffle_seed: number_setting(&settings, "quiz.shuffle_seed", "QUIZ_SHUFFLE_SEED")?,
        };

        Ok(Config {
            storage_mode,
            mongo_uri,
            redis_uri,
            mongo_database,
            content_seed_path,
            server_addr,
            quiz,
        })
    }
}

/// Non-negative integer from the layered settings, falling back to a plain env var.
fn number_setting(
    settings: &config::Config,
    key: &str,
    env_key: &str,
) -> Result<Option<u64>, config::ConfigError> {
    let raw = match settings.get_string(key) {
        Ok(value) => value,
        Err(_) => match env::var(env_key) {
            Ok(value) => value,
            Err(_) => return Ok(None),
        },
    };

    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|err| config::ConfigError::Message(format!("{} must be a number: {}", key, err)))
}
