use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

use crate::core::error::{MensableError, Result};

/// Path that selects a private in-memory store
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Runtime settings, read from `MENSABLE_*` environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind the HTTP server to
    pub host: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// SQLite file, or `:memory:`
    pub database_path: String,
    /// Most questions asked in one quiz
    pub quiz_length: usize,
    /// Largest typo distance still accepted as a right answer
    pub answer_tolerance: usize,
    /// Sessions unused for this long are dropped
    pub session_idle_minutes: i64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = Self {
            host: try_load("MENSABLE_HOST", "127.0.0.1")?,
            port: try_load("MENSABLE_PORT", "8080")?,
            database_path: try_load("MENSABLE_DATABASE", "mensable.db")?,
            quiz_length: try_load("MENSABLE_QUIZ_LENGTH", "10")?,
            answer_tolerance: try_load("MENSABLE_ANSWER_TOLERANCE", "1")?,
            session_idle_minutes: try_load("MENSABLE_SESSION_IDLE_MINUTES", "720")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Settings for tests: in-memory store, default quiz rules
    #[cfg(test)]
    pub fn testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_path: IN_MEMORY_DATABASE.to_string(),
            quiz_length: 10,
            answer_tolerance: 1,
            session_idle_minutes: 720,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.quiz_length == 0 {
            return Err(MensableError::Config("MENSABLE_QUIZ_LENGTH must be at least 1".into()));
        }
        if self.session_idle_minutes <= 0 {
            return Err(MensableError::Config(
                "MENSABLE_SESSION_IDLE_MINUTES must be positive".into(),
            ));
        }
        if self.database_path.trim().is_empty() {
            return Err(MensableError::Config("MENSABLE_DATABASE cannot be empty".into()));
        }
        Ok(())
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        MensableError::Config(format!("Invalid {key} value {raw:?}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_config() {
        let config = Config::testing();
        assert_eq!(config.database_path, IN_MEMORY_DATABASE);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:0");
    }

    #[test]
    fn test_validate_rejects_empty_quiz() {
        let mut config = Config::testing();
        config.quiz_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("MENSABLE_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
        assert!(try_load::<u16>("MENSABLE_TEST_UNSET_PORT", "not a port").is_err());
    }
}
