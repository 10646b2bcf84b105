use contab_core::config as core_config;
use contab_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ContabConfig {
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    /// Optional chart-of-accounts seed file (codigo,nombre,tipo).
    pub chart_csv: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl ContabConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ContabConfig {
            common,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", Some("sqlite://contab.db"), is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1)?,
            },
            chart_csv: env::var("CHART_CSV").ok(),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env(key: &str, default: u32) -> Result<u32, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
