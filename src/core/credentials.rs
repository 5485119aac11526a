use std::fmt;
use thiserror::Error;

pub const API_KEY_VAR: &str = "SONAR_API_KEY";
pub const GRAPHQL_URL_VAR: &str = "GRAPHQL_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("{0} environment variable is empty")]
    Empty(&'static str),
}

#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub graphql_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("graphql_url", &self.graphql_url)
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment after loading a `.env`
    /// file from the working directory, if there is one. Variables already set
    /// in the environment win over the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(?path, "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| -> Result<String, ConfigError> {
            let value = lookup(name).ok_or(ConfigError::Missing(name))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Empty(name));
            }
            Ok(value.to_string())
        };

        Ok(Self {
            api_key: require(API_KEY_VAR)?,
            graphql_url: require(GRAPHQL_URL_VAR)?,
        })
    }
}
