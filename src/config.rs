//! Database selection from the deployment environment.
//!
//! `test` and `prod` pin the database name; any other environment uses the
//! configured name, defaulting to `task_management_dev`.

use std::fmt;
use thiserror::Error;

/// Server URL used when none is configured.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432";

/// Database name used outside `test` and `prod` when none is configured.
pub const DEFAULT_DATABASE_NAME: &str = "task_management_dev";

const TEST_DATABASE_NAME: &str = "task_management_test";
const PRODUCTION_DATABASE_NAME: &str = "task_management";

/// Deployment environment named by `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeploymentEnvironment {
    /// Local development; also used for unrecognized values.
    #[default]
    Development,
    /// Automated tests.
    Test,
    /// Production.
    Production,
}

impl DeploymentEnvironment {
    /// Reads an environment name. Unrecognized names mean development.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "test" => Self::Test,
            "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Returns the canonical environment name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "dev",
            Self::Test => "test",
            Self::Production => "prod",
        }
    }
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while resolving database settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The server URL is blank.
    #[error("database URL must not be empty")]
    EmptyUrl,

    /// The database name contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid database name '{0}'")]
    InvalidDatabaseName(String),
}

/// Resolved database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    environment: DeploymentEnvironment,
    url: String,
    name: String,
}

impl DatabaseSettings {
    /// Resolves settings from the raw `ENV`, `DB_URL` and `DB_NAME` values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyUrl`] for a blank URL and
    /// [`ConfigError::InvalidDatabaseName`] for a name that is not a plain
    /// identifier.
    pub fn resolve(
        environment: Option<&str>,
        url: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let env = environment.map_or_else(DeploymentEnvironment::default, DeploymentEnvironment::parse);
        let resolved_url = url.unwrap_or(DEFAULT_DATABASE_URL).trim();
        if resolved_url.is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        let resolved_name = match env {
            DeploymentEnvironment::Test => TEST_DATABASE_NAME,
            DeploymentEnvironment::Production => PRODUCTION_DATABASE_NAME,
            DeploymentEnvironment::Development => name.unwrap_or(DEFAULT_DATABASE_NAME).trim(),
        };
        let well_formed = !resolved_name.is_empty()
            && resolved_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(ConfigError::InvalidDatabaseName(resolved_name.to_owned()));
        }
        Ok(Self {
            environment: env,
            url: resolved_url.trim_end_matches('/').to_owned(),
            name: resolved_name.to_owned(),
        })
    }

    /// Returns the deployment environment.
    #[must_use]
    pub const fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    /// Returns the server URL without a database path.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the connection URL for the resolved database.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!("{}/{}", self.url, self.name)
    }
}
