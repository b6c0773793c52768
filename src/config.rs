use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_label(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // API settings
    pub api_host: String,
    pub api_port: u16,
    /// Public base URL, used for links on the welcome page
    pub api_base_url: String,

    // Rate limiting
    pub disable_rate_limiting: bool,
    /// One request of quota is restored every this many milliseconds
    pub rate_limit_replenish_ms: u64,
    pub rate_limit_burst: u32,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_port = env_or("API_PORT", 3000);

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port,
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{api_port}")),

            disable_rate_limiting: env_or("DISABLE_RATE_LIMITING", false),
            rate_limit_replenish_ms: env_or("RATE_LIMIT_REPLENISH_MS", 100),
            rate_limit_burst: env_or("RATE_LIMIT_BURST", 60),

            deployment: Deployment::from_label(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    /// Configuration for the offline importer, which only needs the database.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `DATABASE_URL` is not set.
    pub fn database_url_from_env() -> Result<String, ConfigError> {
        dotenvy::dotenv().ok();
        env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Read and parse an optional variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_labels() {
        assert_eq!(Deployment::from_label("Production"), Deployment::Prod);
        assert_eq!(Deployment::from_label("staging"), Deployment::Stage);
        assert_eq!(Deployment::from_label("dev"), Deployment::Dev);
        assert_eq!(Deployment::from_label("anything"), Deployment::Local);
    }

    #[test]
    fn unset_variable_uses_default() {
        let port: u16 = env_or("FUKUOKA_TEST_SURELY_UNSET_VARIABLE", 4242);
        assert_eq!(port, 4242);
    }
}
