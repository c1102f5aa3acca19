use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// When unset, the service runs against the in-memory store.
    pub database_url: Option<String>,
    pub ai_scoring_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub mail_connector_url: Option<String>,
    pub calendar_connector_url: Option<String>,
    pub external_timeout_secs: u64,
    pub scheduler_lookahead_days: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL").ok(),
            ai_scoring_url: env::var("AI_SCORING_URL").ok(),
            ai_api_key: env::var("AI_API_KEY").ok(),
            mail_connector_url: env::var("MAIL_CONNECTOR_URL").ok(),
            calendar_connector_url: env::var("CALENDAR_CONNECTOR_URL").ok(),
            external_timeout_secs: get_env_or("EXTERNAL_TIMEOUT_SECS", 10)?,
            scheduler_lookahead_days: get_env_or("SCHEDULER_LOOKAHEAD_DAYS", 30)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
