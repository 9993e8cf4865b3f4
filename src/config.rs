use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub payment_webhook_secret: String,
    pub payment_api_url: String,
    pub frontend_url: String,
    pub student_rps: u32,
    pub admin_rps: u32,
    pub trial_days: i64,
    pub subscription_days: i64,
    pub session_sweep_interval_seconds: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            payment_webhook_secret: get_env("PAYMENT_WEBHOOK_SECRET")?,
            payment_api_url: get_env("PAYMENT_API_URL")?,
            frontend_url: get_env("FRONTEND_URL")?,
            student_rps: get_env_parse("STUDENT_RPS")?,
            admin_rps: get_env_parse("ADMIN_RPS")?,
            trial_days: env::var("TRIAL_DAYS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|e| Error::Config(format!("Invalid value for TRIAL_DAYS: {}", e)))?
                .unwrap_or(5),
            subscription_days: env::var("SUBSCRIPTION_DAYS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|e| Error::Config(format!("Invalid value for SUBSCRIPTION_DAYS: {}", e)))?
                .unwrap_or(30),
            session_sweep_interval_seconds: env::var("SESSION_SWEEP_INTERVAL_SECONDS")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .map_err(|e| {
                    Error::Config(format!(
                        "Invalid value for SESSION_SWEEP_INTERVAL_SECONDS: {}",
                        e
                    ))
                })?
                .unwrap_or(5),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
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
